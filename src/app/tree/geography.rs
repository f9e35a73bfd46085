//! Static geography tables for grouping and location hints
//!
//! The tables are plain data wrapped in a [`Geography`] value that is handed
//! to the tree builder and the location hint logic. Tests build their own
//! small `Geography` instead of relying on the built-in one.

use std::collections::HashMap;

/// Bucket for regions no table recognises
pub const FALLBACK_CONTINENT: &str = "other";

/// Flag shown for countries without an entry
pub const FALLBACK_FLAG: &str = "🏳️";

/// Continent id, label and display priority (lower first)
const CONTINENTS: &[(&str, &str, u32)] = &[
    ("north-america", "🌎 North America", 1),
    ("europe", "🌍 Europe", 2),
    ("asia", "🌏 Asia", 3),
    ("australia-oceania", "🌏 Australia and Oceania", 4),
    ("south-america", "🌎 South America", 5),
    ("africa", "🌍 Africa", 6),
    ("central-america", "🌎 Central America", 7),
    ("antarctica", "🌐 Antarctica", 8),
    (FALLBACK_CONTINENT, "🌐 Other", 99),
];

/// Legacy continent ids folded into current ones
const CONTINENT_ALIASES: &[(&str, &str)] = &[("oceania", "australia-oceania")];

const COUNTRY_CONTINENTS: &[(&str, &str)] = &[
    ("us", "north-america"),
    ("canada", "north-america"),
    ("mexico", "north-america"),
    ("greenland", "north-america"),
    ("germany", "europe"),
    ("france", "europe"),
    ("italy", "europe"),
    ("spain", "europe"),
    ("united-kingdom", "europe"),
    ("poland", "europe"),
    ("netherlands", "europe"),
    ("belgium", "europe"),
    ("czech-republic", "europe"),
    ("austria", "europe"),
    ("switzerland", "europe"),
    ("sweden", "europe"),
    ("norway", "europe"),
    ("denmark", "europe"),
    ("finland", "europe"),
    ("portugal", "europe"),
    ("greece", "europe"),
    ("hungary", "europe"),
    ("ireland-and-northern-ireland", "europe"),
    ("romania", "europe"),
    ("bulgaria", "europe"),
    ("croatia", "europe"),
    ("serbia", "europe"),
    ("slovenia", "europe"),
    ("slovakia", "europe"),
    ("estonia", "europe"),
    ("latvia", "europe"),
    ("lithuania", "europe"),
    ("ukraine", "europe"),
    ("belarus", "europe"),
    ("moldova", "europe"),
    ("russia", "europe"),
    ("albania", "europe"),
    ("bosnia-herzegovina", "europe"),
    ("montenegro", "europe"),
    ("macedonia", "europe"),
    ("kosovo", "europe"),
    ("luxembourg", "europe"),
    ("malta", "europe"),
    ("cyprus", "europe"),
    ("iceland", "europe"),
    ("china", "asia"),
    ("japan", "asia"),
    ("india", "asia"),
    ("indonesia", "asia"),
    ("thailand", "asia"),
    ("malaysia-singapore-brunei", "asia"),
    ("south-korea", "asia"),
    ("philippines", "asia"),
    ("vietnam", "asia"),
    ("myanmar", "asia"),
    ("cambodia", "asia"),
    ("laos", "asia"),
    ("bangladesh", "asia"),
    ("pakistan", "asia"),
    ("sri-lanka", "asia"),
    ("nepal", "asia"),
    ("bhutan", "asia"),
    ("afghanistan", "asia"),
    ("iran", "asia"),
    ("iraq", "asia"),
    ("syria", "asia"),
    ("turkey", "europe"),
    ("israel-and-palestine", "asia"),
    ("jordan", "asia"),
    ("lebanon", "asia"),
    ("gcc-states", "asia"),
    ("yemen", "asia"),
    ("georgia", "europe"),
    ("armenia", "asia"),
    ("azerbaijan", "asia"),
    ("kazakhstan", "asia"),
    ("uzbekistan", "asia"),
    ("kyrgyzstan", "asia"),
    ("tajikistan", "asia"),
    ("turkmenistan", "asia"),
    ("mongolia", "asia"),
    ("north-korea", "asia"),
    ("taiwan", "asia"),
    ("brazil", "south-america"),
    ("argentina", "south-america"),
    ("chile", "south-america"),
    ("colombia", "south-america"),
    ("peru", "south-america"),
    ("venezuela", "south-america"),
    ("ecuador", "south-america"),
    ("bolivia", "south-america"),
    ("paraguay", "south-america"),
    ("uruguay", "south-america"),
    ("guyana", "south-america"),
    ("suriname", "south-america"),
    ("south-africa", "africa"),
    ("egypt", "africa"),
    ("morocco", "africa"),
    ("kenya", "africa"),
    ("nigeria", "africa"),
    ("ethiopia", "africa"),
    ("ghana", "africa"),
    ("algeria", "africa"),
    ("libya", "africa"),
    ("tunisia", "africa"),
    ("sudan", "africa"),
    ("uganda", "africa"),
    ("tanzania", "africa"),
    ("madagascar", "africa"),
    ("mozambique", "africa"),
    ("angola", "africa"),
    ("zimbabwe", "africa"),
    ("botswana", "africa"),
    ("namibia", "africa"),
    ("zambia", "africa"),
    ("malawi", "africa"),
    ("congo-brazzaville", "africa"),
    ("congo-democratic-republic", "africa"),
    ("cameroon", "africa"),
    ("ivory-coast", "africa"),
    ("burkina-faso", "africa"),
    ("mali", "africa"),
    ("niger", "africa"),
    ("chad", "africa"),
    ("senegal-and-gambia", "africa"),
    ("guinea", "africa"),
    ("benin", "africa"),
    ("togo", "africa"),
    ("liberia", "africa"),
    ("sierra-leone", "africa"),
    ("mauritania", "africa"),
    ("somalia", "africa"),
    ("eritrea", "africa"),
    ("djibouti", "africa"),
    ("rwanda", "africa"),
    ("burundi", "africa"),
    ("central-african-republic", "africa"),
    ("equatorial-guinea", "africa"),
    ("gabon", "africa"),
    ("australia", "australia-oceania"),
    ("new-zealand", "australia-oceania"),
    ("papua-new-guinea", "australia-oceania"),
    ("fiji", "australia-oceania"),
    ("new-caledonia", "australia-oceania"),
    ("vanuatu", "australia-oceania"),
    ("samoa", "australia-oceania"),
    ("tonga", "australia-oceania"),
    ("solomon-islands", "australia-oceania"),
    ("marshall-islands", "australia-oceania"),
    ("micronesia", "australia-oceania"),
    ("palau", "australia-oceania"),
    ("nauru", "australia-oceania"),
    ("kiribati", "australia-oceania"),
    ("tuvalu", "australia-oceania"),
    ("cook-islands", "australia-oceania"),
    ("polynesie-francaise", "australia-oceania"),
];

const FLAGS: &[(&str, &str)] = &[
    ("us", "🇺🇸"),
    ("canada", "🇨🇦"),
    ("mexico", "🇲🇽"),
    ("germany", "🇩🇪"),
    ("france", "🇫🇷"),
    ("italy", "🇮🇹"),
    ("spain", "🇪🇸"),
    ("united-kingdom", "🇬🇧"),
    ("poland", "🇵🇱"),
    ("netherlands", "🇳🇱"),
    ("belgium", "🇧🇪"),
    ("czech-republic", "🇨🇿"),
    ("austria", "🇦🇹"),
    ("switzerland", "🇨🇭"),
    ("sweden", "🇸🇪"),
    ("norway", "🇳🇴"),
    ("denmark", "🇩🇰"),
    ("russia", "🇷🇺"),
    ("finland", "🇫🇮"),
    ("iceland", "🇮🇸"),
    ("china", "🇨🇳"),
    ("japan", "🇯🇵"),
    ("india", "🇮🇳"),
    ("indonesia", "🇮🇩"),
    ("thailand", "🇹🇭"),
    ("south-korea", "🇰🇷"),
    ("brazil", "🇧🇷"),
    ("argentina", "🇦🇷"),
    ("chile", "🇨🇱"),
    ("colombia", "🇨🇴"),
    ("south-africa", "🇿🇦"),
    ("egypt", "🇪🇬"),
    ("morocco", "🇲🇦"),
    ("kenya", "🇰🇪"),
    ("australia", "🇦🇺"),
    ("new-zealand", "🇳🇿"),
];

/// Country names as reported by geolocation providers, to catalog ids
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("united states", "us"),
    ("united states of america", "us"),
    ("usa", "us"),
    ("us", "us"),
    ("canada", "canada"),
    ("mexico", "mexico"),
    ("germany", "germany"),
    ("france", "france"),
    ("united kingdom", "united-kingdom"),
    ("uk", "united-kingdom"),
    ("gb", "united-kingdom"),
    ("italy", "italy"),
    ("spain", "spain"),
    ("netherlands", "netherlands"),
    ("the netherlands", "netherlands"),
    ("poland", "poland"),
    ("sweden", "sweden"),
    ("norway", "norway"),
    ("denmark", "denmark"),
    ("finland", "finland"),
    ("russia", "russia"),
    ("china", "china"),
    ("japan", "japan"),
    ("india", "india"),
    ("australia", "australia"),
    ("new zealand", "new-zealand"),
    ("brazil", "brazil"),
    ("argentina", "argentina"),
    ("chile", "chile"),
    ("south africa", "south-africa"),
    ("egypt", "egypt"),
    ("morocco", "morocco"),
];

/// US states by name and postal abbreviation
const US_STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// A continent bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continent {
    pub id: String,
    pub label: String,
    pub priority: u32,
}

/// Immutable lookup tables for grouping regions
#[derive(Debug, Clone, Default)]
pub struct Geography {
    continents: HashMap<String, Continent>,
    aliases: HashMap<String, String>,
    country_continents: HashMap<String, String>,
    flags: HashMap<String, String>,
    country_names: HashMap<String, String>,
    subdivisions: HashMap<String, HashMap<String, String>>,
    split_country: Option<String>,
}

impl Geography {
    /// Built-in tables for the Geofabrik catalog
    pub fn builtin() -> Self {
        let mut geography = Self::default();

        for (id, label, priority) in CONTINENTS {
            geography = geography.with_continent(id, label, *priority);
        }
        for (alias, id) in CONTINENT_ALIASES {
            geography
                .aliases
                .insert(alias.to_string(), id.to_string());
        }
        for (country, continent) in COUNTRY_CONTINENTS {
            geography = geography.with_country(country, continent);
        }
        for (country, flag) in FLAGS {
            geography = geography.with_flag(country, flag);
        }
        for (name, id) in COUNTRY_NAMES {
            geography = geography.with_country_name(name, id);
        }
        for (state, abbreviation) in US_STATES {
            let id = format!("us/{}", state.to_lowercase().replace(' ', "-"));
            geography = geography
                .with_subdivision("us", state, &id)
                .with_subdivision("us", abbreviation, &id);
        }
        geography.split_country = Some("us".to_string());

        geography
    }

    /// Register a continent bucket
    pub fn with_continent(mut self, id: &str, label: &str, priority: u32) -> Self {
        self.continents.insert(
            id.to_string(),
            Continent {
                id: id.to_string(),
                label: label.to_string(),
                priority,
            },
        );
        self
    }

    /// Map a country id to its continent
    pub fn with_country(mut self, country: &str, continent: &str) -> Self {
        self.country_continents
            .insert(country.to_string(), continent.to_string());
        self
    }

    /// Register a flag for a country id
    pub fn with_flag(mut self, country: &str, flag: &str) -> Self {
        self.flags.insert(country.to_string(), flag.to_string());
        self
    }

    /// Map a provider-reported country name to a country id
    pub fn with_country_name(mut self, name: &str, country: &str) -> Self {
        self.country_names
            .insert(name.to_lowercase(), country.to_string());
        self
    }

    /// Map a subdivision name or code within a country to a region id
    pub fn with_subdivision(mut self, country: &str, name: &str, region_id: &str) -> Self {
        self.subdivisions
            .entry(country.to_string())
            .or_default()
            .insert(name.to_lowercase(), region_id.to_string());
        self
    }

    /// Canonical continent id for `id`, folding aliases
    pub fn canonical_continent<'a>(&'a self, id: &'a str) -> Option<&'a str> {
        let id = self.aliases.get(id).map(String::as_str).unwrap_or(id);
        self.continents.get(id).map(|continent| continent.id.as_str())
    }

    /// Continent bucket for a continent id, falling back to "other"
    pub fn continent(&self, id: &str) -> Continent {
        self.canonical_continent(id)
            .and_then(|id| self.continents.get(id))
            .cloned()
            .unwrap_or_else(|| Continent {
                id: id.to_string(),
                label: format!("🌐 {}", crate::app::models::title_case(id)),
                priority: 99,
            })
    }

    /// Continent mapped for a country id
    pub fn continent_of_country(&self, country: &str) -> Option<&str> {
        self.country_continents.get(country).map(String::as_str)
    }

    /// Flag for a country id
    pub fn flag(&self, country: &str) -> &str {
        self.flags
            .get(country)
            .map(String::as_str)
            .unwrap_or(FALLBACK_FLAG)
    }

    /// Country id for a provider-reported country name, case-insensitive
    pub fn country_id(&self, name: &str) -> Option<&str> {
        self.country_names
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Region id for a subdivision of `country`, by name or code
    pub fn subdivision_id(&self, country: &str, name: &str) -> Option<&str> {
        self.subdivisions
            .get(country)?
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Whether `country` keeps its subdivisions in a separate container node
    pub fn is_split_country(&self, country: &str) -> bool {
        self.split_country.as_deref() == Some(country)
    }

    /// Mark `country` as having a separate subdivision container
    pub fn with_split_country(mut self, country: &str) -> Self {
        self.split_country = Some(country.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_continent_priority() {
        let geography = Geography::builtin();
        assert_eq!(geography.continent("north-america").priority, 1);
        assert_eq!(geography.continent("europe").label, "🌍 Europe");
        assert_eq!(geography.continent(FALLBACK_CONTINENT).priority, 99);
    }

    #[test]
    fn test_alias_folds_into_canonical_continent() {
        let geography = Geography::builtin();
        assert_eq!(
            geography.canonical_continent("oceania"),
            Some("australia-oceania")
        );
        assert_eq!(geography.canonical_continent("germany"), None);
    }

    #[test]
    fn test_unknown_continent_gets_generic_label() {
        let geography = Geography::builtin();
        let continent = geography.continent("atlantis");
        assert_eq!(continent.label, "🌐 Atlantis");
        assert_eq!(continent.priority, 99);
    }

    #[test]
    fn test_country_lookups() {
        let geography = Geography::builtin();
        assert_eq!(geography.country_id("United States"), Some("us"));
        assert_eq!(geography.country_id("  germany "), Some("germany"));
        assert_eq!(geography.continent_of_country("us"), Some("north-america"));
        assert_eq!(geography.flag("germany"), "🇩🇪");
        assert_eq!(geography.flag("atlantis"), FALLBACK_FLAG);
    }

    #[test]
    fn test_us_state_by_name_or_code() {
        let geography = Geography::builtin();
        assert_eq!(
            geography.subdivision_id("us", "California"),
            Some("us/california")
        );
        assert_eq!(geography.subdivision_id("us", "ny"), Some("us/new-york"));
        assert_eq!(
            geography.subdivision_id("us", "District of Columbia"),
            Some("us/district-of-columbia")
        );
        assert!(geography.is_split_country("us"));
    }
}
