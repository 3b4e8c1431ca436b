mod feed;
mod render;
mod view;

pub use feed::{FeedPhase, SmoothedFrame, Smoother, SpectrumFeed};
pub use view::SpectrumView;
