use clap::ValueEnum;

/// How each listed entry is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ListingStyle {
    /// Indented by depth, `+` for entries with children, `|` otherwise
    #[default]
    Pretty,
    /// Plain names under one banner per generation
    Generations,
}
