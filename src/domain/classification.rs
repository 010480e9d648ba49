use serde::Serialize;

use crate::domain::ticket::{Category, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub suggested_category: Category,
    pub suggested_priority: Priority,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            suggested_category: Category::General,
            suggested_priority: Priority::Medium,
        }
    }
}
