pub mod driver;
pub mod flavor;

pub use driver::{LiveRunner, LiveTester};
pub use flavor::{CannedFlavor, ChatCompletionsSource, FlavorConfig, FlavorError, build_source};
