use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Waiting,
    Resolved,
    Closed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Waiting => "WAITING",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }

    /// OPEN / IN_PROGRESS / WAITING are the active states; the rest are
    /// terminal.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TicketStatus::Open | TicketStatus::InProgress | TicketStatus::Waiting
        )
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TicketStatus::Open),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "WAITING" => Ok(TicketStatus::Waiting),
            "RESOLVED" => Ok(TicketStatus::Resolved),
            "CLOSED" => Ok(TicketStatus::Closed),
            "CANCELLED" => Ok(TicketStatus::Cancelled),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
    Critical,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "LOW",
            TicketPriority::Medium => "MEDIUM",
            TicketPriority::High => "HIGH",
            TicketPriority::Urgent => "URGENT",
            TicketPriority::Critical => "CRITICAL",
        }
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(TicketPriority::Low),
            "MEDIUM" => Ok(TicketPriority::Medium),
            "HIGH" => Ok(TicketPriority::High),
            "URGENT" => Ok(TicketPriority::Urgent),
            "CRITICAL" => Ok(TicketPriority::Critical),
            other => Err(format!("unknown ticket priority: {}", other)),
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    /// Human-facing sequential number, unique and monotonic per tenant,
    /// zero-padded to at least three digits ("001", "002", ...).
    pub number: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    /// None for guest-submitted tickets; the guest contact fields are
    /// mandatory in that case.
    pub creator_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Render a sequential number in its wire form.
    pub fn format_number(n: u32) -> String {
        format!("{:03}", n)
    }

    /// Parse the numeric value back out of a stored number.
    pub fn numeric_value(number: &str) -> Option<u32> {
        number.parse().ok()
    }

    /// Move the ticket to `status`, stamping `resolved_at` / `closed_at`
    /// on first entry only. Re-entering the same state never re-stamps.
    pub fn transition_to(&mut self, status: TicketStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            TicketStatus::Resolved if self.resolved_at.is_none() => {
                self.resolved_at = Some(now);
            }
            TicketStatus::Closed if self.closed_at.is_none() => {
                self.closed_at = Some(now);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            number: "001".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            due_date: None,
            tenant_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            creator_id: None,
            assignee_id: None,
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            resolved_at: None,
            closed_at: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn number_formatting_pads_to_three_digits() {
        assert_eq!(Ticket::format_number(1), "001");
        assert_eq!(Ticket::format_number(42), "042");
        assert_eq!(Ticket::format_number(1234), "1234");
    }

    #[test]
    fn resolved_stamp_is_idempotent() {
        let mut ticket = blank_ticket();
        let t1 = Utc::now();
        ticket.transition_to(TicketStatus::Resolved, t1);
        assert_eq!(ticket.resolved_at, Some(t1));

        let t2 = t1 + chrono::Duration::hours(1);
        ticket.transition_to(TicketStatus::Resolved, t2);
        assert_eq!(ticket.resolved_at, Some(t1));
    }

    #[test]
    fn closed_stamp_survives_reopen() {
        let mut ticket = blank_ticket();
        let t1 = Utc::now();
        ticket.transition_to(TicketStatus::Closed, t1);
        ticket.transition_to(TicketStatus::Open, t1 + chrono::Duration::hours(1));
        ticket.transition_to(TicketStatus::Closed, t1 + chrono::Duration::hours(2));
        assert_eq!(ticket.closed_at, Some(t1));
    }
}
