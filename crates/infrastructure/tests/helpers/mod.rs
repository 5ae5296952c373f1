#![allow(dead_code)]

mod mock_upstream;

pub use mock_upstream::{MockBehavior, MockUpstream};
