mod percent;
mod watt;

pub use percent::Percent;
pub use watt::Watt;
