//! Row models for the SQLite tables.

mod conversation_record;
mod item_record;
mod turn_record;

pub use conversation_record::ConversationRecord;
pub use item_record::ItemRecord;
pub use turn_record::TurnRecord;
