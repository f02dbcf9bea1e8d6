pub mod passcoder;

pub use passcoder::PasscoderClient;
