// 🏋️ Club Entity - spends points on competition places
//
// Name is the booking key, email is the login key. Points never go negative:
// the only mutation is a settlement debit, which is checked.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    /// Unique club name (booking key)
    pub name: String,

    /// Secretary email used for the email-lookup login
    pub email: String,

    /// Current point balance (1 point buys 1 place)
    pub points: u32,
}

impl Club {
    pub fn new(name: impl Into<String>, email: impl Into<String>, points: u32) -> Self {
        Club {
            name: name.into(),
            email: email.into(),
            points,
        }
    }

    /// Debit points, refusing to go below zero
    pub fn debit(&mut self, points: u32) -> Option<u32> {
        self.points = self.points.checked_sub(points)?;
        Some(self.points)
    }
}
