pub mod blob;
pub mod extract;
pub mod sms;
pub mod store;
pub mod tts;
pub mod weather;

pub use blob::HttpBlobAdapter;
pub use extract::OpenAiExtractionAdapter;
pub use sms::TwilioSmsAdapter;
pub use store::PgDocumentStore;
pub use tts::OpenAiTtsAdapter;
pub use weather::OpenWeatherAdapter;
