use crate::models::CleanRecord;
use crate::utils::constants::UNKNOWN;
use std::collections::HashMap;
use tracing::debug;

/// Monitoring zones whose operating organization is known when the feed omits it
pub const ZONE_ORGANIZATIONS: &[(&str, &str)] = &[
    ("ZR NOUVELLE-AQUITAINE", "ATMO NOUVELLE-AQUITAINE"),
    ("ZR GRAND-EST", "ATMO GRAND EST"),
    ("ZR BOURGOGNE-FRANCHE-COMTE", "ATMO BOURGOGNE-FRANCHE-COMTE"),
    ("ZR OCCITANIE", "ATMO OCCITANIE"),
    ("ZR NORMANDIE", "ATMO NORMANDIE"),
    ("ZR CENTRE-VAL-DE-LOIRE", "LIG'AIR"),
    ("ZR BRETAGNE", "AIR BREIZH"),
    ("ZAR BASTIA", "QUALITAIR CORSE"),
    ("ZAR AJACCIO", "QUALITAIR CORSE"),
    ("ZAR CHALON", "ATMO BOURGOGNE-FRANCHE-COMTE"),
    ("ZR CENTRE-VAL DE LOIRE", "LIG'AIR"),
    ("ZR CORSE", "QUALITAIR CORSE"),
    ("ZAR FREJUS-DRAGUIGNAN", "ATMO SUD"),
];

/// Reference department of each approved monitoring association
pub const ORGANIZATION_DEPARTMENTS: &[(&str, &str)] = &[
    ("AIR BREIZH", "Finistere"),
    ("AIR PAYS DE LA LOIRE", "Loire-Atlantique"),
    ("AIRPARIF", "Paris"),
    ("ATMO AUVERGNE-RHÔNE-ALPES", "Rhone"),
    ("ATMO BOURGOGNE-FRANCHE-COMTE", "Cote-d'Or"),
    ("ATMO GRAND EST", "Bas-Rhin"),
    ("ATMO GUYANE", "Guyane"),
    ("ATMO HAUTS DE FRANCE", "Nord"),
    ("ATMO NORMANDIE", "Seine-Maritime"),
    ("ATMO NOUVELLE-AQUITAINE", "Gironde"),
    ("ATMO OCCITANIE", "Haute-Garonne"),
    ("ATMO REUNION", "La Reunion"),
    ("ATMO SUD", "Bouches-du-Rhone"),
    ("GWAD'AIR", "Guadeloupe"),
    ("HAWA MAYOTTE", "Mayotte"),
    ("LIG'AIR", "Loiret"),
    ("MADININAIR", "Martinique"),
    ("QUALITAIR CORSE", "Corse-du-Sud"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub organizations_filled: usize,
    pub unmapped_departments: usize,
}

/// Fills missing organizations from the zone and attaches departments
pub struct ZoneOrganizationResolver {
    zone_organizations: HashMap<&'static str, &'static str>,
    organization_departments: HashMap<&'static str, &'static str>,
}

impl ZoneOrganizationResolver {
    pub fn new() -> Self {
        Self {
            zone_organizations: ZONE_ORGANIZATIONS.iter().copied().collect(),
            organization_departments: ORGANIZATION_DEPARTMENTS.iter().copied().collect(),
        }
    }

    pub fn organization_for_zone(&self, zone: &str) -> Option<&'static str> {
        self.zone_organizations.get(zone).copied()
    }

    pub fn department_for(&self, organization: &str) -> Option<&'static str> {
        self.organization_departments.get(organization).copied()
    }

    /// Resolve organizations and departments in place.
    ///
    /// A known organization is never replaced; only empty or sentinel values
    /// are looked up by zone. Departments are derived from the organization
    /// alone.
    pub fn resolve(&self, records: &mut [CleanRecord]) -> ResolutionStats {
        let mut stats = ResolutionStats::default();

        for record in records.iter_mut() {
            if record.organization.is_empty() || record.organization == UNKNOWN {
                if let Some(organization) = self.organization_for_zone(&record.zone) {
                    record.organization = organization.to_string();
                    stats.organizations_filled += 1;
                }
            }

            record.department = self
                .department_for(&record.organization)
                .map(str::to_string);
            if record.department.is_none() {
                stats.unmapped_departments += 1;
            }
        }

        debug!(
            filled = stats.organizations_filled,
            unmapped = stats.unmapped_departments,
            "resolved organizations"
        );
        stats
    }
}

impl Default for ZoneOrganizationResolver {
    fn default() -> Self {
        Self::new()
    }
}
