//! Built-in curated dataset: airports, metropolitan city codes and regions.

use super::types::{Coordinates, Destination, DestinationKind, RegionMapping};

use DestinationKind::{Airport, City};

struct BuiltinDestination {
    code: &'static str,
    kind: DestinationKind,
    name: &'static str,
    aliases: &'static [&'static str],
    country: &'static str,
    lat: f64,
    lon: f64,
    tz: &'static str,
    priority: u32,
}

struct BuiltinRegion {
    name: &'static str,
    aliases: &'static [&'static str],
    members: &'static [&'static str],
}

const BUILTIN_DESTINATIONS: &[BuiltinDestination] = &[
    // ─── North America ──────────────────────────────────────────
    BuiltinDestination {
        code: "NYC", kind: City, name: "New York City",
        aliases: &["new york", "newyork", "nyc", "big apple", "manhattan"],
        country: "US", lat: 40.7128, lon: -74.0060, tz: "America/New_York", priority: 100,
    },
    BuiltinDestination {
        code: "JFK", kind: Airport, name: "John F. Kennedy International Airport",
        aliases: &["jfk airport", "kennedy airport", "john f kennedy"],
        country: "US", lat: 40.6413, lon: -73.7781, tz: "America/New_York", priority: 95,
    },
    BuiltinDestination {
        code: "LGA", kind: Airport, name: "LaGuardia Airport",
        aliases: &["laguardia"],
        country: "US", lat: 40.7769, lon: -73.8740, tz: "America/New_York", priority: 70,
    },
    BuiltinDestination {
        code: "EWR", kind: Airport, name: "Newark Liberty International Airport",
        aliases: &["newark"],
        country: "US", lat: 40.6895, lon: -74.1745, tz: "America/New_York", priority: 70,
    },
    BuiltinDestination {
        code: "BOS", kind: Airport, name: "Boston Logan International Airport",
        aliases: &["boston", "logan"],
        country: "US", lat: 42.3656, lon: -71.0096, tz: "America/New_York", priority: 75,
    },
    BuiltinDestination {
        code: "CHI", kind: City, name: "Chicago",
        aliases: &["chicago", "windy city"],
        country: "US", lat: 41.8781, lon: -87.6298, tz: "America/Chicago", priority: 80,
    },
    BuiltinDestination {
        code: "ORD", kind: Airport, name: "Chicago O'Hare International Airport",
        aliases: &["ohare", "o hare"],
        country: "US", lat: 41.9742, lon: -87.9073, tz: "America/Chicago", priority: 75,
    },
    BuiltinDestination {
        code: "MIA", kind: Airport, name: "Miami International Airport",
        aliases: &["miami", "miami beach"],
        country: "US", lat: 25.7959, lon: -80.2870, tz: "America/New_York", priority: 80,
    },
    BuiltinDestination {
        code: "MCO", kind: Airport, name: "Orlando International Airport",
        aliases: &["orlando", "disney world"],
        country: "US", lat: 28.4312, lon: -81.3081, tz: "America/New_York", priority: 70,
    },
    BuiltinDestination {
        code: "LAX", kind: Airport, name: "Los Angeles International Airport",
        aliases: &["los angeles", "la", "hollywood"],
        country: "US", lat: 33.9416, lon: -118.4085, tz: "America/Los_Angeles", priority: 90,
    },
    BuiltinDestination {
        code: "SFO", kind: Airport, name: "San Francisco International Airport",
        aliases: &["san francisco", "sf", "frisco", "bay area"],
        country: "US", lat: 37.6213, lon: -122.3790, tz: "America/Los_Angeles", priority: 85,
    },
    BuiltinDestination {
        code: "SAN", kind: Airport, name: "San Diego International Airport",
        aliases: &["san diego"],
        country: "US", lat: 32.7338, lon: -117.1933, tz: "America/Los_Angeles", priority: 70,
    },
    BuiltinDestination {
        code: "SJC", kind: Airport, name: "San Jose Mineta International Airport",
        aliases: &["san jose", "silicon valley"],
        country: "US", lat: 37.3639, lon: -121.9289, tz: "America/Los_Angeles", priority: 55,
    },
    BuiltinDestination {
        code: "SJU", kind: Airport, name: "San Juan Luis Munoz Marin International Airport",
        aliases: &["san juan", "puerto rico"],
        country: "PR", lat: 18.4394, lon: -66.0018, tz: "America/Puerto_Rico", priority: 50,
    },
    BuiltinDestination {
        code: "HNL", kind: Airport, name: "Honolulu Daniel K. Inouye International Airport",
        aliases: &["honolulu", "oahu", "waikiki"],
        country: "US", lat: 21.3187, lon: -157.9225, tz: "Pacific/Honolulu", priority: 70,
    },
    BuiltinDestination {
        code: "OGG", kind: Airport, name: "Kahului Airport",
        aliases: &["maui", "kahului"],
        country: "US", lat: 20.8986, lon: -156.4305, tz: "Pacific/Honolulu", priority: 60,
    },
    BuiltinDestination {
        code: "KOA", kind: Airport, name: "Ellison Onizuka Kona International Airport",
        aliases: &["kona", "big island"],
        country: "US", lat: 19.7388, lon: -156.0456, tz: "Pacific/Honolulu", priority: 50,
    },
    BuiltinDestination {
        code: "LIH", kind: Airport, name: "Lihue Airport",
        aliases: &["kauai", "lihue"],
        country: "US", lat: 21.9760, lon: -159.3390, tz: "Pacific/Honolulu", priority: 45,
    },
    BuiltinDestination {
        code: "CUN", kind: Airport, name: "Cancun International Airport",
        aliases: &["cancun", "riviera maya", "tulum"],
        country: "MX", lat: 21.0365, lon: -86.8771, tz: "America/Cancun", priority: 75,
    },
    // ─── South America ──────────────────────────────────────────
    BuiltinDestination {
        code: "SCL", kind: Airport, name: "Santiago Arturo Merino Benitez International Airport",
        aliases: &["santiago", "santiago de chile"],
        country: "CL", lat: -33.3930, lon: -70.7858, tz: "America/Santiago", priority: 60,
    },
    // ─── Western Europe ─────────────────────────────────────────
    BuiltinDestination {
        code: "LON", kind: City, name: "London",
        aliases: &["london"],
        country: "GB", lat: 51.5074, lon: -0.1278, tz: "Europe/London", priority: 100,
    },
    BuiltinDestination {
        code: "LHR", kind: Airport, name: "London Heathrow Airport",
        aliases: &["heathrow"],
        country: "GB", lat: 51.4700, lon: -0.4543, tz: "Europe/London", priority: 95,
    },
    BuiltinDestination {
        code: "LGW", kind: Airport, name: "London Gatwick Airport",
        aliases: &["gatwick"],
        country: "GB", lat: 51.1537, lon: -0.1821, tz: "Europe/London", priority: 80,
    },
    BuiltinDestination {
        code: "PAR", kind: City, name: "Paris",
        aliases: &["paris", "city of light"],
        country: "FR", lat: 48.8566, lon: 2.3522, tz: "Europe/Paris", priority: 100,
    },
    BuiltinDestination {
        code: "CDG", kind: Airport, name: "Paris Charles de Gaulle Airport",
        aliases: &["charles de gaulle", "roissy"],
        country: "FR", lat: 49.0097, lon: 2.5479, tz: "Europe/Paris", priority: 90,
    },
    BuiltinDestination {
        code: "ORY", kind: Airport, name: "Paris Orly Airport",
        aliases: &["orly"],
        country: "FR", lat: 48.7262, lon: 2.3652, tz: "Europe/Paris", priority: 75,
    },
    BuiltinDestination {
        code: "NCE", kind: Airport, name: "Nice Côte d'Azur Airport",
        aliases: &["nice"],
        country: "FR", lat: 43.6584, lon: 7.2159, tz: "Europe/Paris", priority: 80,
    },
    BuiltinDestination {
        code: "CEQ", kind: Airport, name: "Cannes Mandelieu Airport",
        aliases: &["cannes", "mandelieu"],
        country: "FR", lat: 43.5420, lon: 6.9534, tz: "Europe/Paris", priority: 60,
    },
    BuiltinDestination {
        code: "MCM", kind: Airport, name: "Monaco Heliport",
        aliases: &["monaco", "monte carlo"],
        country: "MC", lat: 43.7253, lon: 7.4197, tz: "Europe/Monaco", priority: 60,
    },
    BuiltinDestination {
        code: "TLN", kind: Airport, name: "Toulon Hyères Airport",
        aliases: &["toulon", "hyeres", "saint-tropez", "st tropez"],
        country: "FR", lat: 43.0973, lon: 6.1460, tz: "Europe/Paris", priority: 45,
    },
    BuiltinDestination {
        code: "MRS", kind: Airport, name: "Marseille Provence Airport",
        aliases: &["marseille", "marseilles"],
        country: "FR", lat: 43.4393, lon: 5.2214, tz: "Europe/Paris", priority: 65,
    },
    BuiltinDestination {
        code: "BCN", kind: Airport, name: "Barcelona El Prat Airport",
        aliases: &["barcelona", "barca"],
        country: "ES", lat: 41.2974, lon: 2.0833, tz: "Europe/Madrid", priority: 90,
    },
    BuiltinDestination {
        code: "MAD", kind: Airport, name: "Adolfo Suárez Madrid-Barajas Airport",
        aliases: &["madrid", "barajas"],
        country: "ES", lat: 40.4983, lon: -3.5676, tz: "Europe/Madrid", priority: 85,
    },
    BuiltinDestination {
        code: "AGP", kind: Airport, name: "Málaga-Costa del Sol Airport",
        aliases: &["malaga", "marbella"],
        country: "ES", lat: 36.6749, lon: -4.4991, tz: "Europe/Madrid", priority: 70,
    },
    BuiltinDestination {
        code: "GIB", kind: Airport, name: "Gibraltar International Airport",
        aliases: &["gibraltar"],
        country: "GI", lat: 36.1512, lon: -5.3497, tz: "Europe/Gibraltar", priority: 35,
    },
    BuiltinDestination {
        code: "PMI", kind: Airport, name: "Palma de Mallorca Airport",
        aliases: &["palma", "mallorca", "majorca"],
        country: "ES", lat: 39.5517, lon: 2.7388, tz: "Europe/Madrid", priority: 70,
    },
    BuiltinDestination {
        code: "IBZ", kind: Airport, name: "Ibiza Airport",
        aliases: &["ibiza", "eivissa"],
        country: "ES", lat: 38.8729, lon: 1.3731, tz: "Europe/Madrid", priority: 65,
    },
    BuiltinDestination {
        code: "MAH", kind: Airport, name: "Menorca Airport",
        aliases: &["menorca", "minorca", "mahon"],
        country: "ES", lat: 39.8626, lon: 4.2186, tz: "Europe/Madrid", priority: 45,
    },
    BuiltinDestination {
        code: "LIS", kind: Airport, name: "Lisbon Humberto Delgado Airport",
        aliases: &["lisbon", "lisboa"],
        country: "PT", lat: 38.7742, lon: -9.1342, tz: "Europe/Lisbon", priority: 80,
    },
    BuiltinDestination {
        code: "FAO", kind: Airport, name: "Faro Airport",
        aliases: &["faro"],
        country: "PT", lat: 37.0144, lon: -7.9659, tz: "Europe/Lisbon", priority: 55,
    },
    // ─── Italy & Greece ─────────────────────────────────────────
    BuiltinDestination {
        code: "ROM", kind: City, name: "Rome",
        aliases: &["rome", "roma", "eternal city"],
        country: "IT", lat: 41.9028, lon: 12.4964, tz: "Europe/Rome", priority: 95,
    },
    BuiltinDestination {
        code: "FCO", kind: Airport, name: "Rome Fiumicino Airport",
        aliases: &["fiumicino", "leonardo da vinci airport"],
        country: "IT", lat: 41.8003, lon: 12.2389, tz: "Europe/Rome", priority: 85,
    },
    BuiltinDestination {
        code: "NAP", kind: Airport, name: "Naples International Airport",
        aliases: &["naples", "napoli", "positano", "amalfi"],
        country: "IT", lat: 40.8860, lon: 14.2908, tz: "Europe/Rome", priority: 65,
    },
    BuiltinDestination {
        code: "VCE", kind: Airport, name: "Venice Marco Polo Airport",
        aliases: &["venice", "venezia"],
        country: "IT", lat: 45.5053, lon: 12.3519, tz: "Europe/Rome", priority: 80,
    },
    BuiltinDestination {
        code: "FLR", kind: Airport, name: "Florence Airport",
        aliases: &["florence", "firenze"],
        country: "IT", lat: 43.8100, lon: 11.2051, tz: "Europe/Rome", priority: 70,
    },
    BuiltinDestination {
        code: "PSA", kind: Airport, name: "Pisa International Airport",
        aliases: &["pisa"],
        country: "IT", lat: 43.6839, lon: 10.3927, tz: "Europe/Rome", priority: 55,
    },
    BuiltinDestination {
        code: "ATH", kind: Airport, name: "Athens International Airport",
        aliases: &["athens", "athina"],
        country: "GR", lat: 37.9364, lon: 23.9445, tz: "Europe/Athens", priority: 80,
    },
    BuiltinDestination {
        code: "JTR", kind: Airport, name: "Santorini (Thira) Airport",
        aliases: &["santorini", "thira", "fira"],
        country: "GR", lat: 36.3992, lon: 25.4793, tz: "Europe/Athens", priority: 65,
    },
    BuiltinDestination {
        code: "JMK", kind: Airport, name: "Mykonos Airport",
        aliases: &["mykonos"],
        country: "GR", lat: 37.4351, lon: 25.3481, tz: "Europe/Athens", priority: 60,
    },
    BuiltinDestination {
        code: "HER", kind: Airport, name: "Heraklion International Airport",
        aliases: &["heraklion", "crete", "iraklio"],
        country: "GR", lat: 35.3397, lon: 25.1803, tz: "Europe/Athens", priority: 60,
    },
    BuiltinDestination {
        code: "CFU", kind: Airport, name: "Corfu International Airport",
        aliases: &["corfu", "kerkyra"],
        country: "GR", lat: 39.6019, lon: 19.9117, tz: "Europe/Athens", priority: 50,
    },
    BuiltinDestination {
        code: "RHO", kind: Airport, name: "Rhodes International Airport",
        aliases: &["rhodes", "rodos"],
        country: "GR", lat: 36.4054, lon: 28.0862, tz: "Europe/Athens", priority: 50,
    },
    // ─── Nordics ────────────────────────────────────────────────
    BuiltinDestination {
        code: "STO", kind: City, name: "Stockholm",
        aliases: &["stockholm"],
        country: "SE", lat: 59.3293, lon: 18.0686, tz: "Europe/Stockholm", priority: 75,
    },
    BuiltinDestination {
        code: "ARN", kind: Airport, name: "Stockholm Arlanda Airport",
        aliases: &["arlanda"],
        country: "SE", lat: 59.6498, lon: 17.9238, tz: "Europe/Stockholm", priority: 70,
    },
    BuiltinDestination {
        code: "OSL", kind: Airport, name: "Oslo Gardermoen Airport",
        aliases: &["oslo", "gardermoen"],
        country: "NO", lat: 60.1976, lon: 11.1004, tz: "Europe/Oslo", priority: 70,
    },
    BuiltinDestination {
        code: "CPH", kind: Airport, name: "Copenhagen Airport",
        aliases: &["copenhagen", "kobenhavn", "kastrup"],
        country: "DK", lat: 55.6180, lon: 12.6508, tz: "Europe/Copenhagen", priority: 75,
    },
    BuiltinDestination {
        code: "TOS", kind: Airport, name: "Tromsø Airport",
        aliases: &["tromso", "tromsoe"],
        country: "NO", lat: 69.6833, lon: 18.9189, tz: "Europe/Oslo", priority: 45,
    },
    BuiltinDestination {
        code: "LYR", kind: Airport, name: "Svalbard Airport, Longyear",
        aliases: &["svalbard", "longyearbyen"],
        country: "NO", lat: 78.2461, lon: 15.4656, tz: "Arctic/Longyearbyen", priority: 30,
    },
    BuiltinDestination {
        code: "RVN", kind: Airport, name: "Rovaniemi Airport",
        aliases: &["rovaniemi", "santa claus village"],
        country: "FI", lat: 66.5648, lon: 25.8304, tz: "Europe/Helsinki", priority: 45,
    },
    BuiltinDestination {
        code: "KTT", kind: Airport, name: "Kittilä Airport",
        aliases: &["kittila", "levi"],
        country: "FI", lat: 67.7010, lon: 24.8468, tz: "Europe/Helsinki", priority: 35,
    },
    BuiltinDestination {
        code: "IVL", kind: Airport, name: "Ivalo Airport",
        aliases: &["ivalo", "saariselka"],
        country: "FI", lat: 68.6073, lon: 27.4053, tz: "Europe/Helsinki", priority: 30,
    },
    // ─── Middle East & Africa ───────────────────────────────────
    BuiltinDestination {
        code: "IST", kind: Airport, name: "Istanbul Airport",
        aliases: &["istanbul", "constantinople"],
        country: "TR", lat: 41.2753, lon: 28.7519, tz: "Europe/Istanbul", priority: 85,
    },
    BuiltinDestination {
        code: "DXB", kind: Airport, name: "Dubai International Airport",
        aliases: &["dubai"],
        country: "AE", lat: 25.2532, lon: 55.3657, tz: "Asia/Dubai", priority: 90,
    },
    BuiltinDestination {
        code: "CAI", kind: Airport, name: "Cairo International Airport",
        aliases: &["cairo", "al-qahirah"],
        country: "EG", lat: 30.1219, lon: 31.4056, tz: "Africa/Cairo", priority: 70,
    },
    BuiltinDestination {
        code: "JED", kind: Airport, name: "King Abdulaziz International Airport",
        aliases: &["jeddah", "jiddah", "mecca", "makkah"],
        country: "SA", lat: 21.6796, lon: 39.1565, tz: "Asia/Riyadh", priority: 65,
    },
    BuiltinDestination {
        code: "MED", kind: Airport, name: "Prince Mohammad bin Abdulaziz Airport",
        aliases: &["medina", "madinah", "al-madinah"],
        country: "SA", lat: 24.5534, lon: 39.7051, tz: "Asia/Riyadh", priority: 55,
    },
    BuiltinDestination {
        code: "RUH", kind: Airport, name: "King Khalid International Airport",
        aliases: &["riyadh"],
        country: "SA", lat: 24.9576, lon: 46.6988, tz: "Asia/Riyadh", priority: 60,
    },
    // ─── Asia Pacific ───────────────────────────────────────────
    BuiltinDestination {
        code: "TYO", kind: City, name: "Tokyo",
        aliases: &["tokyo"],
        country: "JP", lat: 35.6762, lon: 139.6503, tz: "Asia/Tokyo", priority: 95,
    },
    BuiltinDestination {
        code: "HND", kind: Airport, name: "Tokyo Haneda Airport",
        aliases: &["haneda"],
        country: "JP", lat: 35.5494, lon: 139.7798, tz: "Asia/Tokyo", priority: 85,
    },
    BuiltinDestination {
        code: "NRT", kind: Airport, name: "Tokyo Narita International Airport",
        aliases: &["narita"],
        country: "JP", lat: 35.7720, lon: 140.3929, tz: "Asia/Tokyo", priority: 80,
    },
    BuiltinDestination {
        code: "SYD", kind: Airport, name: "Sydney Kingsford Smith Airport",
        aliases: &["sydney"],
        country: "AU", lat: -33.9399, lon: 151.1753, tz: "Australia/Sydney", priority: 80,
    },
];

const BUILTIN_REGIONS: &[BuiltinRegion] = &[
    BuiltinRegion {
        name: "French Riviera",
        aliases: &["cote d'azur", "riviera", "south of france"],
        members: &["NCE", "CEQ", "MCM", "TLN"],
    },
    BuiltinRegion {
        name: "Amalfi Coast",
        aliases: &["costiera amalfitana"],
        members: &["NAP"],
    },
    BuiltinRegion {
        name: "Tuscany",
        aliases: &["toscana"],
        members: &["FLR", "PSA"],
    },
    BuiltinRegion {
        name: "Greek Islands",
        aliases: &["cyclades", "aegean islands"],
        members: &["JTR", "JMK", "HER", "RHO", "CFU"],
    },
    BuiltinRegion {
        name: "Balearic Islands",
        aliases: &["balearics", "islas baleares"],
        members: &["PMI", "IBZ", "MAH"],
    },
    BuiltinRegion {
        name: "Costa del Sol",
        aliases: &["sun coast"],
        members: &["AGP", "GIB"],
    },
    BuiltinRegion {
        name: "Algarve",
        aliases: &[],
        members: &["FAO"],
    },
    BuiltinRegion {
        name: "Hawaii",
        aliases: &["hawaiian islands", "hawai'i"],
        members: &["HNL", "OGG", "KOA", "LIH"],
    },
    BuiltinRegion {
        name: "Lapland",
        aliases: &["finnish lapland", "northern lights"],
        members: &["RVN", "KTT", "IVL", "TOS"],
    },
    BuiltinRegion {
        name: "Scandinavia",
        aliases: &["nordics"],
        members: &["CPH", "ARN", "OSL"],
    },
];

/// All built-in destinations.
pub fn destinations() -> Vec<Destination> {
    BUILTIN_DESTINATIONS
        .iter()
        .map(|d| Destination {
            code: d.code.to_string(),
            kind: d.kind,
            display_name: d.name.to_string(),
            country: d.country.to_string(),
            coordinates: Coordinates::new(d.lat, d.lon),
            aliases: d.aliases.iter().map(|a| a.to_string()).collect(),
            timezone: Some(d.tz.to_string()),
            priority: d.priority,
        })
        .collect()
}

/// All built-in regions, members in curated order.
pub fn regions() -> Vec<RegionMapping> {
    BUILTIN_REGIONS
        .iter()
        .map(|r| RegionMapping {
            region_name: r.name.to_string(),
            aliases: r.aliases.iter().map(|a| a.to_string()).collect(),
            member_codes: r.members.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}
