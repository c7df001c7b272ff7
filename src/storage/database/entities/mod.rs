/// Batch entity module
pub mod batch;
/// Batch word entity module
pub mod batch_word;
/// Word result entity module
pub mod word_result;

pub use batch::Entity as Batch;
pub use batch_word::Entity as BatchWord;
pub use word_result::Entity as WordResult;
