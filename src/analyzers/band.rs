use serde::Serialize;

/// Agreement band for a location's average deviation score.
///
/// | Score       | Band     | Colour |
/// |-------------|----------|--------|
/// | < 5         | Tight    | blue   |
/// | < 10        | Close    | green  |
/// | < 15        | Loose    | yellow |
/// | < 20        | Wide     | orange |
/// | >= 20       | Divergent| red    |
/// | no score    | Unknown  | gray   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Tight,
    Close,
    Loose,
    Wide,
    Divergent,
    Unknown,
}

impl Band {
    pub fn color(self) -> &'static str {
        match self {
            Band::Tight => "blue",
            Band::Close => "green",
            Band::Loose => "yellow",
            Band::Wide => "orange",
            Band::Divergent => "red",
            Band::Unknown => "gray",
        }
    }
}

pub fn band(score: Option<f64>) -> Band {
    match score {
        None => Band::Unknown,
        Some(s) if s.is_nan() => Band::Unknown,
        Some(s) if s < 5.0 => Band::Tight,
        Some(s) if s < 10.0 => Band::Close,
        Some(s) if s < 15.0 => Band::Loose,
        Some(s) if s < 20.0 => Band::Wide,
        Some(_) => Band::Divergent,
    }
}
