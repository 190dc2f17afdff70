mod bias;
mod common;
mod properties;
mod routing;
