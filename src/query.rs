use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Render three independent flags as the positional `0`/`1` digit string
/// the API expects, e.g. `[true, false, true]` -> `"101"`.
pub fn encode_flags(flags: [bool; 3]) -> String {
    flags.iter().map(|&set| if set { '1' } else { '0' }).collect()
}

/// Inverse of [`encode_flags`]. Only exactly three `0`/`1` digits are accepted.
pub fn decode_flags(s: &str) -> Result<[bool; 3], ParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 3 {
        return Err(ParseError::Flags(s.to_string()));
    }

    let mut flags = [false; 3];
    for (flag, byte) in flags.iter_mut().zip(bytes) {
        *flag = match *byte {
            b'1' => true,
            b'0' => false,
            _ => return Err(ParseError::Flags(s.to_string())),
        };
    }
    Ok(flags)
}

/// Content-type filter. Positional order on the wire: general, anime, people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Categories {
    pub general: bool,
    pub anime: bool,
    pub people: bool,
}

impl Categories {
    pub const ALL: Categories = Categories {
        general: true,
        anime: true,
        people: true,
    };

    pub fn encode(&self) -> String {
        encode_flags([self.general, self.anime, self.people])
    }

    pub fn decode(s: &str) -> Result<Self, ParseError> {
        let [general, anime, people] = decode_flags(s)?;
        Ok(Self {
            general,
            anime,
            people,
        })
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self::ALL
    }
}

/// Content-safety filter. Positional order on the wire: safe, sketchy, explicit.
///
/// An all-clear mask is legal and sent as `"000"`; what the server makes of
/// it is up to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Purity {
    pub safe: bool,
    pub sketchy: bool,
    pub explicit: bool,
}

impl Purity {
    pub const SAFE: Purity = Purity {
        safe: true,
        sketchy: false,
        explicit: false,
    };

    pub fn encode(&self) -> String {
        encode_flags([self.safe, self.sketchy, self.explicit])
    }

    pub fn decode(s: &str) -> Result<Self, ParseError> {
        let [safe, sketchy, explicit] = decode_flags(s)?;
        Ok(Self {
            safe,
            sketchy,
            explicit,
        })
    }
}

impl Default for Purity {
    fn default() -> Self {
        Self::SAFE
    }
}

macro_rules! flag_string_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.encode())
            }
        }

        impl FromStr for $ty {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::decode(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::decode(&s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.encode()
            }
        }
    };
}

flag_string_impls!(Categories);
flag_string_impls!(Purity);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sorting {
    #[default]
    Relevance,
    Random,
    DateAdded,
    Views,
    Favorites,
}

impl Sorting {
    pub const ALL: [Sorting; 5] = [
        Sorting::Relevance,
        Sorting::Random,
        Sorting::DateAdded,
        Sorting::Views,
        Sorting::Favorites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sorting::Relevance => "relevance",
            Sorting::Random => "random",
            Sorting::DateAdded => "date_added",
            Sorting::Views => "views",
            Sorting::Favorites => "favorites",
        }
    }
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sorting {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sorting::ALL
            .into_iter()
            .find(|sorting| sorting.as_str() == s)
            .ok_or_else(|| ParseError::Sorting(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            _ => Err(ParseError::Order(s.to_string())),
        }
    }
}

/// One search request. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: String,
    pub categories: Categories,
    pub purity: Purity,
    pub sorting: Sorting,
    pub order: Order,
    pub page: u32,
    /// Server-issued seed that keeps `random` ordering stable across pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            categories: Categories::default(),
            purity: Purity::default(),
            sorting: Sorting::default(),
            order: Order::default(),
            page: 1,
            seed: None,
        }
    }
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Query-string pairs in wire order. The API key is not part of the
    /// query; the client appends it.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("categories", self.categories.encode()),
            ("purity", self.purity.encode()),
            ("sorting", self.sorting.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
            ("page", self.page.to_string()),
        ];

        if self.sorting == Sorting::Random {
            if let Some(seed) = self.seed.as_deref().filter(|s| !s.is_empty()) {
                pairs.push(("seed", seed.to_string()));
            }
        }

        pairs
    }

    /// Rebuild a query from decoded query-string pairs. Unknown keys
    /// (including `apikey`) are ignored and missing keys keep their defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = SearchQuery::default();

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "q" => query.query = value.to_string(),
                "categories" => query.categories = value.parse()?,
                "purity" => query.purity = value.parse()?,
                "sorting" => query.sorting = value.parse()?,
                "order" => query.order = value.parse()?,
                "page" => {
                    query.page = value
                        .parse()
                        .map_err(|_| ParseError::Page(value.to_string()))?
                }
                "seed" => query.seed = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_flags_positionally() {
        assert_eq!(encode_flags([true, false, true]), "101");
        assert_eq!(encode_flags([false, false, false]), "000");
        assert_eq!(encode_flags([true, true, true]), "111");
    }

    #[test]
    fn every_flag_combination_encodes_and_decodes() {
        for bits in 0u8..8 {
            let flags = [bits & 4 != 0, bits & 2 != 0, bits & 1 != 0];
            let encoded = encode_flags(flags);
            assert_eq!(encoded, format!("{:03b}", bits));
            assert_eq!(decode_flags(&encoded).unwrap(), flags);
        }
    }

    #[test]
    fn rejects_malformed_flags() {
        for bad in ["", "1", "11", "1111", "12a", "abc", " 11"] {
            assert_eq!(decode_flags(bad), Err(ParseError::Flags(bad.to_string())));
        }
    }

    #[test]
    fn category_fields_map_to_positions() {
        let categories = Categories {
            general: true,
            anime: false,
            people: true,
        };
        assert_eq!(categories.encode(), "101");

        let purity: Purity = "010".parse().unwrap();
        assert!(!purity.safe);
        assert!(purity.sketchy);
        assert!(!purity.explicit);
    }

    #[test]
    fn sorting_and_order_strings() {
        assert_eq!(Sorting::DateAdded.as_str(), "date_added");
        for sorting in Sorting::ALL {
            assert_eq!(sorting.as_str().parse::<Sorting>().unwrap(), sorting);
        }
        assert!("newest".parse::<Sorting>().is_err());
        assert_eq!("asc".parse::<Order>().unwrap(), Order::Asc);
        assert!("ASC".parse::<Order>().is_err());
    }

    #[test]
    fn default_query_matches_app_defaults() {
        let query = SearchQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.categories.encode(), "111");
        assert_eq!(query.purity.encode(), "100");
        assert_eq!(query.sorting, Sorting::Relevance);
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn pairs_are_in_wire_order() {
        let pairs = SearchQuery::new("landscape").with_page(3).query_pairs();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["q", "categories", "purity", "sorting", "order", "page"]
        );
        assert_eq!(pairs[5].1, "3");
    }

    #[test]
    fn seed_only_sent_for_random_sorting() {
        let mut query = SearchQuery {
            seed: Some("XekqJ6".to_string()),
            ..SearchQuery::default()
        };
        assert!(!query.query_pairs().iter().any(|(k, _)| *k == "seed"));

        query.sorting = Sorting::Random;
        let seeds: Vec<_> = query
            .query_pairs()
            .into_iter()
            .filter(|(k, _)| *k == "seed")
            .collect();
        assert_eq!(seeds, vec![("seed", "XekqJ6".to_string())]);
    }

    #[test]
    fn pairs_round_trip() {
        let query = SearchQuery {
            query: "city lights".to_string(),
            categories: Categories {
                general: false,
                anime: true,
                people: false,
            },
            purity: Purity {
                safe: true,
                sketchy: true,
                explicit: false,
            },
            sorting: Sorting::Favorites,
            order: Order::Asc,
            page: 12,
            seed: None,
        };
        let back = SearchQuery::from_pairs(query.query_pairs()).unwrap();
        assert_eq!(back, query);
    }

    #[test]
    fn serializes_flags_as_digit_strings() {
        let json = serde_json::to_value(SearchQuery::default()).unwrap();
        assert_eq!(json["categories"], "111");
        assert_eq!(json["purity"], "100");
        assert_eq!(json["sorting"], "relevance");
        assert!(json.get("seed").is_none());

        let parsed: SearchQuery =
            serde_json::from_str(r#"{"purity": "001", "sorting": "date_added"}"#).unwrap();
        assert_eq!(parsed.purity, Purity { safe: false, sketchy: false, explicit: true });
        assert_eq!(parsed.sorting, Sorting::DateAdded);
        assert_eq!(parsed.page, 1);

        assert!(serde_json::from_str::<SearchQuery>(r#"{"purity": "2"}"#).is_err());
    }
}
