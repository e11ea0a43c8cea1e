use crate::models::GeoPosition;
use validator::Validate;

/// Reference places, in lookup priority order: (name, latitude, longitude)
pub const KNOWN_PLACES: &[(&str, f64, f64)] = &[
    ("PARIS", 48.8566, 2.3522),
    ("LYON", 45.7640, 4.8357),
    ("MARSEILLE", 43.2965, 5.3698),
    ("TOULOUSE", 43.6047, 1.4442),
    ("NICE", 43.7102, 7.2620),
    ("NANTES", 47.2184, -1.5536),
    ("STRASBOURG", 48.5734, 7.7521),
    ("MONTPELLIER", 43.6108, 3.8767),
    ("BORDEAUX", 44.8378, -0.5792),
    ("LILLE", 50.6292, 3.0573),
    ("RENNES", 48.1173, -1.6778),
    ("REIMS", 49.2583, 4.0317),
    ("SAINT-ETIENNE", 45.4397, 4.3872),
    ("TOULON", 43.1242, 5.9280),
    ("GRENOBLE", 45.1885, 5.7245),
    ("DIJON", 47.3220, 5.0415),
    ("ANGERS", 47.4784, -0.5632),
    ("NIMES", 43.8367, 4.3601),
    ("CLERMONT", 45.7772, 3.0870),
    ("HAVRE", 49.4944, 0.1079),
    ("AIX", 43.5297, 5.4474),
    ("BREST", 48.3904, -4.4861),
    ("TOURS", 47.3941, 0.6848),
    ("AMIENS", 49.8941, 2.2958),
    ("LIMOGES", 45.8336, 1.2611),
    ("ANNECY", 45.8992, 6.1294),
    ("PERPIGNAN", 42.6886, 2.8948),
    ("BESANCON", 47.2380, 6.0243),
    ("ORLEANS", 47.9029, 1.9093),
    ("ROUEN", 49.4432, 1.0993),
    ("MULHOUSE", 47.7508, 7.3359),
    ("CAEN", 49.1829, -0.3707),
    ("NANCY", 48.6921, 6.1844),
    ("METZ", 49.1193, 6.1757),
    ("AVIGNON", 43.9493, 4.8055),
    ("VALENCE", 44.9334, 4.8924),
    ("CHAMBERY", 45.5646, 5.9178),
    ("TROYES", 48.2973, 4.0744),
    ("LORIENT", 47.7482, -3.3703),
    ("POITIERS", 46.5802, 0.3404),
    ("ROCHELLE", 46.1591, -1.1520),
    ("BAYONNE", 43.4933, -1.4748),
    ("PAU", 43.2951, -0.3708),
    ("CALAIS", 50.9513, 1.8587),
    ("VALENCIENNES", 50.3587, 3.5233),
    ("DUNKERQUE", 51.0343, 2.3768),
    ("ARRAS", 50.2919, 2.7772),
    ("DOUAI", 50.3714, 3.0799),
    ("LENS", 50.4281, 2.8317),
    ("COLMAR", 48.0778, 7.3584),
    ("CHARLEVILLE", 49.7628, 4.7194),
    ("CHERBOURG", 49.6337, -1.6220),
    ("EVREUX", 49.0246, 1.1510),
    ("NIORT", 46.3236, -0.4646),
    ("ANGOULEME", 45.6484, 0.1561),
    ("BEAUVAIS", 49.4295, 2.0807),
    ("NEVERS", 46.9896, 3.1615),
    ("BELFORT", 47.6380, 6.8629),
    ("BOURG", 46.2054, 5.2259),
    ("MACON", 46.3067, 4.8306),
    ("VIENNE", 45.5256, 4.8776),
    ("GAP", 44.5597, 6.0794),
    ("DIGNE", 44.0927, 6.2361),
    ("MARTIGUES", 43.4054, 5.0539),
    ("CANNES", 43.5528, 7.0174),
    ("ANTIBES", 43.5808, 7.1239),
    ("VILLEURBANNE", 45.7640, 4.8357),
    ("COTE D OPALE", 50.7264, 1.6147),
    ("COTE-D-OPALE", 50.7264, 1.6147),
    ("BLDV", 50.6292, 3.0573),
    ("CREIL", 49.2606, 2.4750),
    ("SAINT-DENIS", -20.8823, 55.4504),
    ("REUNION", -21.1151, 55.5364),
    ("VOLCAN", -21.2444, 55.7142),
    ("FORT-DE-FRANCE", 14.6160, -61.0595),
    ("MARTINIQUE", 14.6415, -61.0242),
    ("POINTE-A-PITRE", 16.2415, -61.5331),
    ("GUADELOUPE", 16.2650, -61.5510),
    ("ILE-DE-CAYENNE", 4.9227, -52.3269),
    ("CAYENNE", 4.9227, -52.3269),
    ("GUYANE", 4.0, -53.0),
    ("MAYOTTE", -12.8275, 45.1662),
    ("PAYS-DE-LA-LOIRE", 47.7632, -0.3299),
    ("PAYS DE LA LOIRE", 47.7632, -0.3299),
    ("BLOIS", 47.5868, 1.3350),
    ("LE-MANS", 48.0061, 0.1996),
    ("LE MANS", 48.0061, 0.1996),
    ("MANS", 48.0061, 0.1996),
    ("LAVAL", 48.0698, -0.7700),
    ("CHARTRES", 48.4469, 1.4850),
    ("DREUX", 48.7372, 1.3658),
    ("PAYS-DE-SAVOIE", 45.6980, 6.1263),
    ("PAYS DE SAVOIE", 45.6980, 6.1263),
    ("VALLEE-DU-RHONE", 45.0583, 5.0528),
    ("VALLEE DU RHONE", 45.0583, 5.0528),
    ("RHONE", 45.7640, 4.8357),
    ("VALLEE-DE-L-ARVE", 46.0654, 6.7093),
    ("VALLEE DE L ARVE", 46.0654, 6.7093),
    ("ARVE", 46.0654, 6.7093),
    ("VALLEE-DE-LA-TARENTAISE", 45.5189, 6.6510),
    ("TARENTAISE", 45.5189, 6.6510),
    ("MOULINS", 46.5667, 3.3333),
    ("PROVENCE-ALPES-COTE-D-AZUR", 43.9352, 6.0679),
    ("PROVENCE-ALPES-COTE D AZUR", 43.9352, 6.0679),
    ("PROVENCE ALPES COTE D AZUR", 43.9352, 6.0679),
    ("PACA", 43.9352, 6.0679),
    ("DIEPPE", 49.9246, 1.0787),
    ("CHARTRES-DREUX", 48.5920, 1.4252),
    ("URBAIN", 48.8566, 2.3522),
    ("RURAL", 46.5, 2.5),
    ("INDUSTRIEL", 50.6292, 3.0573),
    ("PERIURBAIN", 48.8566, 2.3522),
    ("ZR NOUVELLE-AQUITAINE", 45.75, -0.75),
    ("ZR GRAND-EST", 48.70, 6.20),
    ("ZR BOURGOGNE-FRANCHE-COMTE", 47.28, 5.09),
    ("ZR OCCITANIE", 43.60, 2.30),
    ("ZR NORMANDIE", 49.10, -0.40),
    ("ZR CENTRE-VAL-DE-LOIRE", 47.75, 1.60),
    ("ZR BRETAGNE", 48.10, -2.90),
    ("ZR CORSE", 42.15, 9.00),
    ("ZAR BASTIA", 42.70, 9.45),
    ("ZAR AJACCIO", 41.92, 8.74),
    ("ZAR CHALON", 46.78, 4.85),
    ("ZAR FREJUS-DRAGUIGNAN", 43.43, 6.74),
];

/// Shared words shorter than this never link a zone to a place
const MIN_SHARED_WORD_CHARS: usize = 6;

/// A named reference point with range-checked coordinates
#[derive(Debug, Clone, Validate)]
pub struct KnownPlace {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl KnownPlace {
    pub fn position(&self) -> GeoPosition {
        GeoPosition {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Upper-case, punctuation to spaces, whitespace collapsed
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort coordinates for monitoring zone names.
///
/// Three passes over the reference places, each in priority order: exact
/// normalized name, place name appearing as whole words inside the zone
/// name, then any shared word of six or more characters.
pub struct ZoneLocator {
    places: Vec<(KnownPlace, Vec<String>)>,
}

impl ZoneLocator {
    pub fn new() -> Self {
        Self::with_places(KNOWN_PLACES.iter().map(|&(name, latitude, longitude)| KnownPlace {
            name: name.to_string(),
            latitude,
            longitude,
        }))
    }

    /// Locator over custom places; entries failing validation are skipped
    pub fn with_places(places: impl IntoIterator<Item = KnownPlace>) -> Self {
        let places = places
            .into_iter()
            .filter(|p| match p.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(place = %p.name, error = %e, "ignoring invalid reference place");
                    false
                }
            })
            .map(|p| {
                let words = normalize_name(&p.name)
                    .split(' ')
                    .map(str::to_string)
                    .collect();
                (p, words)
            })
            .collect();
        Self { places }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn locate(&self, zone: &str) -> Option<GeoPosition> {
        let normalized = normalize_name(zone);
        if normalized.is_empty() {
            return None;
        }
        let zone_words: Vec<&str> = normalized.split(' ').collect();

        self.places
            .iter()
            .find(|(_, words)| words.len() == zone_words.len() && words.iter().eq(zone_words.iter()))
            .or_else(|| {
                self.places
                    .iter()
                    .find(|(_, words)| contains_phrase(&zone_words, words))
            })
            .or_else(|| {
                self.places.iter().find(|(_, words)| {
                    words.iter().any(|w| {
                        w.chars().count() >= MIN_SHARED_WORD_CHARS
                            && zone_words.contains(&w.as_str())
                    })
                })
            })
            .map(|(place, _)| place.position())
    }
}

impl Default for ZoneLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_phrase(haystack: &[&str], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(needle).all(|(a, b)| *a == b.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(latitude: f64, longitude: f64) -> Option<GeoPosition> {
        Some(GeoPosition {
            latitude,
            longitude,
        })
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("zag  Aix-Marseille"), "ZAG AIX MARSEILLE");
        assert_eq!(normalize_name("Côte d'Opale"), "CÔTE D OPALE");
        assert_eq!(normalize_name(" -- "), "");
    }

    #[test]
    fn test_exact_match_wins() {
        let locator = ZoneLocator::new();
        assert_eq!(locator.locate("ZAR BASTIA"), at(42.70, 9.45));
        assert_eq!(locator.locate("zr corse"), at(42.15, 9.00));
    }

    #[test]
    fn test_phrase_match_uses_priority_order() {
        let locator = ZoneLocator::new();
        // MARSEILLE precedes AIX in the reference list
        assert_eq!(locator.locate("ZAG MARSEILLE-AIX"), at(43.2965, 5.3698));
        assert_eq!(locator.locate("ZAG PARIS"), at(48.8566, 2.3522));
        // Partial words never match: "LENSE" is not "LENS"
        assert_eq!(locator.locate("ZZZ LENSE"), None);
    }

    #[test]
    fn test_shared_long_word_match() {
        let locator = ZoneLocator::new();
        // "NOUVELLE" links to ZR NOUVELLE-AQUITAINE, listed before ZR BRETAGNE
        assert_eq!(locator.locate("ZR NOUVELLE BRETAGNE"), at(45.75, -0.75));
        // "GRAND" is too short to count on its own
        assert_eq!(locator.locate("ZR GRAND OUEST"), None);
    }

    #[test]
    fn test_unknown_zone() {
        let locator = ZoneLocator::new();
        assert_eq!(locator.locate("UNKNOWN"), None);
        assert_eq!(locator.locate(""), None);
    }

    #[test]
    fn test_reference_places_are_valid() {
        let locator = ZoneLocator::new();
        assert_eq!(locator.len(), KNOWN_PLACES.len());

        let custom = ZoneLocator::with_places(vec![
            KnownPlace {
                name: "NOWHERE".to_string(),
                latitude: 123.0,
                longitude: 0.0,
            },
            KnownPlace {
                name: "SOMEWHERE".to_string(),
                latitude: 10.0,
                longitude: 20.0,
            },
        ]);
        assert_eq!(custom.len(), 1);
        assert_eq!(custom.locate("zone somewhere"), at(10.0, 20.0));
    }
}
