//! Representation selection.
//!
//! Every resource registers an ordered table of [`Offer`]s. Selection walks
//! the requester's Accept ranges from most to least preferred and returns the
//! first offer a range matches. Within one range the table order decides.

use imgapi_core::media::{IMAGE_PNG, JSON_LD, TEXT_N3};

/// Encoder behind an offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    /// Raw image bytes.
    Binary,
    /// RESTdesc / Turtle document.
    N3,
    /// JSON-LD document.
    JsonLd,
}

/// A media type a resource can produce, and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offer {
    pub representation: Representation,
    pub media_type: &'static str,
}

impl Offer {
    pub const N3: Offer = Offer {
        representation: Representation::N3,
        media_type: TEXT_N3,
    };

    pub const JSON_LD: Offer = Offer {
        representation: Representation::JsonLd,
        media_type: JSON_LD,
    };

    /// Raw bytes served as `media_type`.
    pub const fn binary(media_type: &'static str) -> Offer {
        Offer {
            representation: Representation::Binary,
            media_type,
        }
    }
}

/// API root, collection, item and thumbnail affordances.
pub const AFFORDANCE: &[Offer] = &[Offer::N3];

/// Response to a successful upload.
pub const CREATED: &[Offer] = &[Offer::N3, Offer::JSON_LD];

/// Thumbnail: the derived PNG or a link document.
pub const THUMBNAIL: &[Offer] = &[Offer::binary(IMAGE_PNG), Offer::N3, Offer::JSON_LD];

/// Original image, served as its sniffed media type.
pub fn original(media_type: &'static str) -> [Offer; 1] {
    [Offer::binary(media_type)]
}

/// Comma-separated media types of `offers`, for Accept hints and errors.
pub fn media_types(offers: &[Offer]) -> String {
    offers
        .iter()
        .map(|offer| offer.media_type)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One parsed Accept range.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRange {
    main: String,
    sub: String,
    q: f32,
}

impl MediaRange {
    fn parse(item: &str) -> Option<Self> {
        let mut parts = item.split(';');
        let essence = parts.next()?.trim().to_ascii_lowercase();
        let (main, sub) = essence.split_once('/')?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return None;
        }

        let mut q = 1.0;
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("q") {
                q = value.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
            }
        }

        Some(Self {
            main: main.to_string(),
            sub: sub.to_string(),
            q,
        })
    }

    fn matches(&self, media_type: &str) -> bool {
        let Some((main, sub)) = media_type.split_once('/') else {
            return false;
        };
        (self.main == "*" || self.main.eq_ignore_ascii_case(main))
            && (self.sub == "*" || self.sub.eq_ignore_ascii_case(sub))
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

/// Parse an Accept header into ranges ordered by preference.
///
/// Higher q first; equal q keeps header order. Unparseable ranges are
/// dropped. A missing or empty header accepts anything.
pub fn parse_accept(header: Option<&str>) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(MediaRange::parse)
        .collect();

    if ranges.is_empty() {
        return vec![MediaRange {
            main: "*".to_string(),
            sub: "*".to_string(),
            q: 1.0,
        }];
    }

    ranges.sort_by(|a, b| b.q.total_cmp(&a.q));
    ranges
}

/// Pick the offer to serve for `accept`, or `None` if nothing is acceptable.
///
/// A range with `q=0` refuses every offer it matches.
pub fn negotiate(accept: Option<&str>, offers: &[Offer]) -> Option<Offer> {
    let ranges = parse_accept(accept);
    let refused =
        |offer: &Offer| ranges.iter().any(|r| r.q == 0.0 && r.matches(offer.media_type));

    ranges
        .iter()
        .filter(|range| range.q > 0.0)
        .find_map(|range| {
            offers
                .iter()
                .find(|offer| range.matches(offer.media_type) && !refused(offer))
        })
        .copied()
}
