use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Child,
    Teen,
    Adult,
}

impl AgeGroup {
    /// Parse a loose age group string ("Adult", "teenager", "kid").
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "child" | "kid" => Some(AgeGroup::Child),
            "teen" | "teenager" => Some(AgeGroup::Teen),
            "adult" | "parent" => Some(AgeGroup::Adult),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgeGroup::Child => write!(f, "child"),
            AgeGroup::Teen => write!(f, "teen"),
            AgeGroup::Adult => write!(f, "adult"),
        }
    }
}

/// One member of a family roster, as the advisory engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub user_id: String,
    pub age_group: AgeGroup,
    #[serde(default)]
    pub is_admin: bool,
}

impl MemberRecord {
    pub fn new(user_id: impl Into<String>, age_group: AgeGroup, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            age_group,
            is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

impl Family {
    pub fn admins(&self) -> impl Iterator<Item = &MemberRecord> {
        self.members.iter().filter(|m| m.is_admin)
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn display_member_count(&self) -> String {
        match self.members.len() {
            1 => "1 member".to_string(),
            n => format!("{} members", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_parse() {
        assert_eq!(AgeGroup::parse("Adult"), Some(AgeGroup::Adult));
        assert_eq!(AgeGroup::parse(" teenager "), Some(AgeGroup::Teen));
        assert_eq!(AgeGroup::parse("kid"), Some(AgeGroup::Child));
        assert_eq!(AgeGroup::parse("elder"), None);
    }

    #[test]
    fn test_member_record_json_shape() {
        let json = r#"{"userId":"u1","ageGroup":"teen","isAdmin":true}"#;
        let member: MemberRecord = serde_json::from_str(json).expect("parse member");
        assert_eq!(member, MemberRecord::new("u1", AgeGroup::Teen, true));

        let missing_admin = r#"{"userId":"u2","ageGroup":"child"}"#;
        let member: MemberRecord = serde_json::from_str(missing_admin).expect("parse member");
        assert!(!member.is_admin);
    }

    #[test]
    fn test_family_helpers() {
        let family = Family {
            id: "f1".into(),
            name: "Rivera".into(),
            members: vec![
                MemberRecord::new("a", AgeGroup::Adult, true),
                MemberRecord::new("b", AgeGroup::Child, false),
            ],
        };
        assert_eq!(family.admins().count(), 1);
        assert!(family.has_member("b"));
        assert!(!family.has_member("z"));
        assert_eq!(family.display_member_count(), "2 members");
    }
}
