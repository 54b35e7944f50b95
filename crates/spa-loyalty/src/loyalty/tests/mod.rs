mod common;
mod tiers;
