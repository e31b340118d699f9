//! Schedule location strings mapped to coordinates.
//!
//! Keys are lower-case ASCII substrings of what the schedule feed prints in
//! its location field. The longest matching key wins, so "the white house"
//! beats "house" style collisions and "department of state" loses to
//! "u.s. department of state".

use crate::types::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceAlias {
    pub key: &'static str,
    pub coordinates: Coordinates,
    pub name: &'static str,
}

const fn alias(key: &'static str, lat: f64, lon: f64, name: &'static str) -> PlaceAlias {
    PlaceAlias {
        key,
        coordinates: Coordinates::new(lat, lon),
        name,
    }
}

const WH_LAT: f64 = 38.897676;
const WH_LON: f64 = -77.036529;

pub static PLACE_ALIASES: &[PlaceAlias] = &[
    // White House campus
    alias("the white house", WH_LAT, WH_LON, "The White House"),
    alias("oval office", WH_LAT, WH_LON, "Oval Office, WH"),
    alias("roosevelt room", WH_LAT, WH_LON, "Roosevelt Room, WH"),
    alias("cabinet room", WH_LAT, WH_LON, "Cabinet Room, WH"),
    alias("east room", WH_LAT, WH_LON, "East Room, WH"),
    alias("press briefing room", WH_LAT, WH_LON, "James S. Brady Briefing Room, WH"),
    alias("south lawn", WH_LAT, WH_LON, "South Lawn, WH"),
    alias("south portico", WH_LAT, WH_LON, "South Portico, WH"),
    alias("private dining room", WH_LAT, WH_LON, "Private Dining Room, WH"),
    alias("state dining room", WH_LAT, WH_LON, "State Dining Room, WH"),
    alias("blue room", WH_LAT, WH_LON, "Blue Room, WH"),
    alias("red room", WH_LAT, WH_LON, "Red Room, WH"),
    alias("cross hall", WH_LAT, WH_LON, "Cross Hall, WH"),
    alias("diplomatic room", WH_LAT, WH_LON, "Diplomatic Room, WH"),
    alias("grand foyer", WH_LAT, WH_LON, "Grand Foyer, WH"),
    alias("north portico", WH_LAT, WH_LON, "North Portico, WH"),
    alias("situation room", WH_LAT, WH_LON, "Situation Room, WH"),
    alias("in-town pool call time", WH_LAT, WH_LON, "The White House"),
    alias("the people's house", WH_LAT, WH_LON, "The White House"),
    alias("rose garden", 38.8975, -77.0371, "Rose Garden, WH"),
    alias("north lawn", 38.8982, -77.0355, "North Lawn, WH"),
    // Washington, DC and nearby
    alias("the ellipse", 38.893758, -77.035278, "The Ellipse, DC"),
    alias("south court auditorium", 38.897592, -77.038668, "South Court Auditorium, EEOB"),
    alias("blair house", 38.8969, -77.0385, "Blair House, DC"),
    alias("national cathedral", 38.930176, -77.070503, "Washington National Cathedral, DC"),
    alias("washington national cathedral", 38.930176, -77.070503, "Washington National Cathedral, DC"),
    alias("federal reserve", 38.8890, -77.0408, "Federal Reserve (Eccles Building), DC"),
    alias("department of justice", 38.8932, -77.0250, "DOJ Robert F. Kennedy Building, DC"),
    alias("u.s. department of state", 38.894504, -77.048475, "U.S. Department of State, DC"),
    alias("department of state", 38.894504, -77.048475, "U.S. Department of State, DC"),
    alias("st. john's episcopal church", 38.900410, -77.036106, "St. John's Church, Lafayette Square, DC"),
    alias("st. john's church", 38.900410, -77.036106, "St. John's Church, Lafayette Square, DC"),
    alias("u.s. naval observatory", 38.9217, -77.0669, "U.S. Naval Observatory (VP Residence), DC"),
    alias("mount vernon", 38.7102, -77.0888, "George Washington's Mount Vernon, VA"),
    alias("camp david", 39.6481, -77.4650, "Camp David, MD"),
    alias("joint base andrews", 38.810830, -76.866940, "Joint Base Andrews, MD"),
    alias("trump national golf club washington dc", 39.053, -77.347, "Trump Nat'l Golf Club Washington DC, VA"),
    alias("dover air force base", 39.129540, -75.466490, "Dover AFB, DE"),
    // Airports
    alias("morristown municipal airport", 40.79935, -74.41487, "Morristown Municipal Airport, NJ"),
    alias("palm beach intl airport", 26.68390, -80.09559, "Palm Beach Intl. Airport"),
    // Residences and clubs
    alias("mar-a-lago", 26.6758, -80.0364, "Mar-a-Lago, FL"),
    alias("trump tower", 40.7625, -73.973, "Trump Tower, NYC"),
    alias("trump national golf club bedminster", 40.645560, -74.639170, "Trump Nat'l Golf Club Bedminster, NJ"),
    alias("trump national golf club doral", 25.819550, -80.330970, "Trump National Doral, FL"),
    alias("trump national doral miami", 25.819550, -80.330970, "Trump National Doral, FL"),
    alias("trump international hotel las vegas", 36.129545, -115.172821, "Trump International Hotel, Las Vegas"),
    alias("trump international golf links", 57.27393, -2.03299, "Trump International Golf Links, Aberdeen, Scotland"),
    alias("trump turnberry", 55.3272, -4.8364, "Trump Turnberry, Scotland"),
    alias("trump national golf club jupiter", 26.890084, -80.089967, "Trump Nat'l Golf Club Jupiter, FL"),
    alias("trump international golf club west palm beach", 26.706, -80.036, "Trump International Golf Club, West Palm Beach, FL"),
    alias("trump international golf club", 26.706, -80.036, "Trump International Golf Club, West Palm Beach, FL"),
    // Courthouses
    alias("60 centre st", 40.713460, -74.003100, "NY County Supreme Court, 60 Centre St"),
    alias("wilkie d. ferguson jr. courthouse", 25.774180, -80.194545, "Ferguson U.S. Courthouse, Miami"),
    // Abroad
    alias("ritz-carlton abu dhabi", 24.467970, 54.371600, "Ritz-Carlton Abu Dhabi"),
];

/// Lower-case, trim, and fold typographic dashes, quotes and no-break spaces
/// to their ASCII forms.
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' => '-',
            '\u{00a0}' | '\u{202f}' => ' ',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn lookup(text: &str) -> Option<&'static PlaceAlias> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    PLACE_ALIASES
        .iter()
        .filter(|a| normalized.contains(a.key))
        .max_by_key(|a| a.key.len())
}
