//! Matching de nombres de vehículos
//!
//! Resuelve un nombre escrito a mano contra la flota usando una distancia
//! de edición normalizada por longitud. Nunca falla: sin candidatos devuelve
//! una lista vacía y el caller decide si pide sugerencias.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

use crate::models::status_update::{MatchCandidate, MatchType};
use crate::models::vehicle::Vehicle;

lazy_static! {
    static ref NON_NAME_CHARS: Regex = Regex::new(r"[^\p{L}\p{N}\s-]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Umbrales del matcher
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Similitud mínima para aceptar un match "seguro" (find_best)
    pub match_threshold: f64,
    /// Similitud mínima para proponer un nombre como sugerencia
    pub suggestion_threshold: f64,
    pub max_suggestions: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.6,
            suggestion_threshold: 0.3,
            max_suggestions: 3,
        }
    }
}

/// Minúsculas, solo letras/dígitos/espacio/guion, espacios colapsados
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = NON_NAME_CHARS.replace_all(&lowered, "");
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
}

/// Distancia de Levenshtein sobre caracteres (dos filas)
fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len()) as f64;
    (1.0 - edit_distance(&a, &b) as f64 / longest).clamp(0.0, 1.0)
}

/// Similitud en [0,1] entre dos nombres crudos (se normalizan ambos).
/// Simétrica; 1.0 si coinciden tras normalizar; 0.0 si alguno queda vacío.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize_name(a), &normalize_name(b))
}

#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    config: MatcherConfig,
}

impl NameMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Candidatos con similitud >= `min_similarity`, de mejor a peor.
    /// Un match exacto tras normalizar corta la búsqueda y se devuelve solo.
    pub fn resolve(&self, raw_name: &str, vehicles: &[Vehicle], min_similarity: f64) -> Vec<MatchCandidate> {
        let query = normalize_name(raw_name);
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(vehicle) = vehicles.iter().find(|v| normalize_name(&v.name) == query) {
            let match_type = if vehicle.name.trim() == raw_name.trim() {
                MatchType::Exact
            } else {
                MatchType::CaseInsensitive
            };
            return vec![MatchCandidate {
                vehicle: vehicle.clone(),
                similarity: 1.0,
                match_type,
            }];
        }

        let min_similarity = min_similarity.clamp(0.0, 1.0);
        let mut candidates: Vec<MatchCandidate> = vehicles
            .iter()
            .map(|vehicle| MatchCandidate {
                similarity: normalized_similarity(&query, &normalize_name(&vehicle.name)),
                vehicle: vehicle.clone(),
                match_type: MatchType::Fuzzy,
            })
            .filter(|c| c.similarity >= min_similarity)
            .collect();

        // sort_by es estable: los empates conservan el orden del store
        candidates.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        candidates
    }

    /// Mejor candidato por encima del umbral de aceptación, si existe
    pub fn find_best(&self, raw_name: &str, vehicles: &[Vehicle]) -> Option<MatchCandidate> {
        self.resolve(raw_name, vehicles, self.config.match_threshold)
            .into_iter()
            .next()
    }

    /// Nombres parecidos para el mensaje de error de un nombre no resuelto
    pub fn suggestions(&self, raw_name: &str, vehicles: &[Vehicle]) -> Vec<String> {
        self.resolve(raw_name, vehicles, self.config.suggestion_threshold)
            .into_iter()
            .take(self.config.max_suggestions)
            .map(|c| c.vehicle.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::VehicleStatus;

    fn fleet() -> Vec<Vehicle> {
        vec![
            Vehicle::new(1, "BMW 4-Series", VehicleStatus::Good),
            Vehicle::new(2, "Audi RS6", VehicleStatus::Bad),
            Vehicle::new(3, "Лада Веста", VehicleStatus::Average),
        ]
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  BMW   4-Series! "), "bmw 4-series");
        assert_eq!(normalize_name("Лада  ВЕСТА"), "лада веста");
        assert_eq!(normalize_name("???"), "");
    }

    #[test]
    fn test_edit_distance() {
        let d = |a: &str, b: &str| edit_distance(&a.chars().collect::<Vec<_>>(), &b.chars().collect::<Vec<_>>());
        assert_eq!(d("kitten", "sitting"), 3);
        assert_eq!(d("", "abc"), 3);
        assert_eq!(d("abc", "abc"), 0);
    }

    #[test]
    fn test_similarity_properties() {
        for name in ["BMW", "Audi RS6", "Лада"] {
            assert_eq!(similarity(name, name), 1.0);
        }
        assert_eq!(similarity("BMW 4-Series", "Audi RS6"), similarity("Audi RS6", "BMW 4-Series"));
        assert!(similarity("BMW", "Audi") < 0.5);
        assert_eq!(similarity("BMW", "bmw"), 1.0);
        assert_eq!(similarity("", "bmw"), 0.0);
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let matches = NameMatcher::default().resolve("BMW 4-Series", &fleet(), 0.3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].similarity, 1.0);
        assert_eq!(matches[0].match_type, MatchType::Exact);
    }

    #[test]
    fn test_case_insensitive_match() {
        let matches = NameMatcher::default().resolve("bmw 4-series", &fleet(), 0.3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].similarity, 1.0);
        assert_eq!(matches[0].match_type, MatchType::CaseInsensitive);
        assert_eq!(matches[0].vehicle.id, 1);
    }

    #[test]
    fn test_fuzzy_match_on_typo() {
        let best = NameMatcher::default().find_best("Audi RS7", &fleet()).unwrap();
        assert_eq!(best.vehicle.id, 2);
        assert_eq!(best.match_type, MatchType::Fuzzy);
        assert!(best.similarity < 1.0 && best.similarity >= 0.6);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let vehicles = vec![
            Vehicle::new(10, "abcx", VehicleStatus::Good),
            Vehicle::new(11, "abcy", VehicleStatus::Good),
        ];
        let matches = NameMatcher::default().resolve("abcz", &vehicles, 0.3);
        assert_eq!(matches.iter().map(|m| m.vehicle.id).collect::<Vec<_>>(), vec![10, 11]);
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        assert!(NameMatcher::default().resolve("   ", &fleet(), 0.0).is_empty());
        assert!(NameMatcher::default().resolve("BMW", &[], 0.0).is_empty());
    }

    #[test]
    fn test_find_best_rejects_weak_match_but_suggests() {
        let matcher = NameMatcher::default();
        assert!(matcher.find_best("Audi", &fleet()).is_none());
        assert_eq!(matcher.suggestions("Audi", &fleet()), vec!["Audi RS6".to_string()]);
    }
}
