use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub family_id: String,
    pub title: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub completed: bool,
    pub assigned_to: Option<String>,
}

impl Task {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_to.as_deref() == Some(user_id)
    }

    /// Points still on the table for this task.
    pub fn open_points(&self) -> u32 {
        if self.completed {
            0
        } else {
            self.points
        }
    }
}
