pub mod category;
pub mod comment;
pub mod log;
pub mod tenant;
pub mod ticket;
pub mod user;

pub use category::TicketCategory;
pub use comment::TicketComment;
pub use log::{LogEntry, NewLogEntry};
pub use tenant::{Tenant, TenantType};
pub use ticket::{Ticket, TicketPriority, TicketStatus};
pub use user::{Role, User};
