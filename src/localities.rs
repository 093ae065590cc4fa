/// Locality registry for the VIC Emergency monitoring service.
///
/// Defines the canonical list of Victorian localities the geocoder can
/// resolve without a network call, along with their postcodes and
/// coordinates. This is the single source of truth for offline postcode
/// lookup; modules should resolve through here rather than hardcoding codes.

// ---------------------------------------------------------------------------
// Locality metadata
// ---------------------------------------------------------------------------

/// Metadata for a single Victorian locality.
pub struct Locality {
    /// Locality name, uppercase, as it appears in feed location strings.
    pub name: &'static str,
    /// 4-digit postcode in the Victorian 3000-3999 range.
    pub postcode: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
}

/// Victorian localities resolvable offline, grouped by region.
///
/// Sources:
///   - Postcodes: Australia Post postcode data
///   - Coordinates: Vicmap locality centroids (rounded to 4 decimal places)
pub static LOCALITY_REGISTRY: &[Locality] = &[
    // --- Melbourne metro ---------------------------------------------------
    Locality { name: "MELBOURNE", postcode: "3000", latitude: -37.8136, longitude: 144.9631 },
    Locality { name: "EAST MELBOURNE", postcode: "3002", latitude: -37.8167, longitude: 144.9872 },
    Locality { name: "WERRIBEE", postcode: "3030", latitude: -37.9026, longitude: 144.6615 },
    Locality { name: "CRAIGIEBURN", postcode: "3064", latitude: -37.6000, longitude: 144.9410 },
    Locality { name: "EPPING", postcode: "3076", latitude: -37.6460, longitude: 145.0327 },
    Locality { name: "BOX HILL", postcode: "3128", latitude: -37.8190, longitude: 145.1227 },
    Locality { name: "RINGWOOD", postcode: "3134", latitude: -37.8142, longitude: 145.2288 },
    Locality { name: "FERNTREE GULLY", postcode: "3156", latitude: -37.8866, longitude: 145.2950 },
    Locality { name: "DANDENONG", postcode: "3175", latitude: -37.9874, longitude: 145.2149 },
    Locality { name: "FRANKSTON", postcode: "3199", latitude: -38.1413, longitude: 145.1226 },
    Locality { name: "MELTON", postcode: "3337", latitude: -37.6834, longitude: 144.5831 },
    Locality { name: "SUNBURY", postcode: "3429", latitude: -37.5771, longitude: 144.7264 },
    Locality { name: "PAKENHAM", postcode: "3810", latitude: -38.0706, longitude: 145.4873 },
    // --- Geelong, Surf Coast and Otways ------------------------------------
    Locality { name: "GEELONG", postcode: "3220", latitude: -38.1499, longitude: 144.3617 },
    Locality { name: "LORNE", postcode: "3232", latitude: -38.5394, longitude: 143.9755 },
    Locality { name: "APOLLO BAY", postcode: "3233", latitude: -38.7578, longitude: 143.6722 },
    Locality { name: "GELLIBRAND", postcode: "3239", latitude: -38.5265, longitude: 143.5372 },
    Locality { name: "COLAC", postcode: "3250", latitude: -38.3396, longitude: 143.5854 },
    Locality { name: "WARRNAMBOOL", postcode: "3280", latitude: -38.3818, longitude: 142.4880 },
    // --- Western and Central Victoria --------------------------------------
    Locality { name: "BALLARAT CENTRAL", postcode: "3350", latitude: -37.5622, longitude: 143.8503 },
    Locality { name: "HORSHAM", postcode: "3400", latitude: -36.7119, longitude: 142.1998 },
    Locality { name: "MILDURA", postcode: "3500", latitude: -34.2086, longitude: 142.1310 },
    Locality { name: "SWAN HILL", postcode: "3585", latitude: -35.3380, longitude: 143.5544 },
    Locality { name: "BENDIGO", postcode: "3550", latitude: -36.7570, longitude: 144.2794 },
    // --- Goulburn Valley and North East ------------------------------------
    Locality { name: "SHEPPARTON", postcode: "3630", latitude: -36.3805, longitude: 145.3988 },
    Locality { name: "SEYMOUR", postcode: "3660", latitude: -37.0264, longitude: 145.1390 },
    Locality { name: "BENALLA", postcode: "3672", latitude: -36.5515, longitude: 145.9845 },
    Locality { name: "WANGARATTA", postcode: "3677", latitude: -36.3582, longitude: 146.3125 },
    Locality { name: "WODONGA", postcode: "3690", latitude: -36.1214, longitude: 146.8881 },
    Locality { name: "MANSFIELD", postcode: "3722", latitude: -37.0530, longitude: 146.0886 },
    Locality { name: "BRIGHT", postcode: "3741", latitude: -36.7305, longitude: 146.9600 },
    Locality { name: "OMEO", postcode: "3898", latitude: -37.0981, longitude: 147.5969 },
    // --- Yarra Ranges and upper catchments ---------------------------------
    Locality { name: "WHITTLESEA", postcode: "3757", latitude: -37.5130, longitude: 145.1180 },
    Locality { name: "KINGLAKE", postcode: "3763", latitude: -37.5373, longitude: 145.3386 },
    Locality { name: "HEALESVILLE", postcode: "3777", latitude: -37.6533, longitude: 145.5168 },
    Locality { name: "MARYSVILLE", postcode: "3779", latitude: -37.5079, longitude: 145.7484 },
    // --- Gippsland ----------------------------------------------------------
    Locality { name: "TRARALGON", postcode: "3844", latitude: -38.1954, longitude: 146.5415 },
    Locality { name: "SALE", postcode: "3850", latitude: -38.1064, longitude: 147.0680 },
    Locality { name: "BAIRNSDALE", postcode: "3875", latitude: -37.8226, longitude: 147.6109 },
    Locality { name: "ORBOST", postcode: "3888", latitude: -37.7080, longitude: 148.4572 },
    Locality { name: "MALLACOOTA", postcode: "3892", latitude: -37.5539, longitude: 149.7576 },
];

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Looks up a postcode by locality name. Case-insensitive, surrounding
/// whitespace ignored. Returns `None` if the locality is not in the registry.
pub fn postcode_for_locality(name: &str) -> Option<&'static str> {
    let wanted = name.trim().to_uppercase();
    if wanted.is_empty() {
        return None;
    }
    LOCALITY_REGISTRY
        .iter()
        .find(|l| l.name == wanted)
        .map(|l| l.postcode)
}

/// Finds the postcode of the registry locality nearest to the given
/// coordinates, by Haversine distance. Returns `None` for zero coordinates,
/// which the feed uses as its "no position" sentinel.
pub fn nearest_postcode(latitude: f64, longitude: f64) -> Option<&'static str> {
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }

    let mut min_distance = f64::INFINITY;
    let mut nearest = None;

    for locality in LOCALITY_REGISTRY {
        let distance = haversine_km(latitude, longitude, locality.latitude, locality.longitude);
        if distance < min_distance {
            min_distance = distance;
            nearest = Some(locality.postcode);
        }
    }

    nearest
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Checks that a postcode is 4 digits in the Victorian 3000-3999 range.
pub fn is_valid_vic_postcode(postcode: &str) -> bool {
    postcode.len() == 4
        && postcode.chars().all(|c| c.is_ascii_digit())
        && postcode.starts_with('3')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
