// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain instructions for the geoportal analytics schema.

use geoask_config::model::AgentConfig;
use geoask_core::GeoaskError;
use tracing::{info, warn};

/// Default instruction text for the geoportal analytics database.
///
/// Inserted verbatim into the system message. Deployments with a different
/// schema replace it through `agent.instructions_file` or
/// `agent.instructions`.
pub const GEOPORTAL_RULEBOOK: &str = r#"You answer questions about usage of the metropolitan geoportal: which datasets are downloaded or viewed, in which formats, from which municipalities.

TABLES
Use only these tables:
- descarregues: one row per download. Columns: id, data_hora (timestamp), recurs_id, format, idioma, canal, municipi_codi, usuari_tipus.
- visualitzacions: one row per map or layer view. Columns: id, data_hora (timestamp), recurs_id, idioma, canal, municipi_codi.
- recursos: catalogue of published resources. Columns: id, titol, categoria, tematica, organisme, data_publicacio.
- municipis: municipalities. Columns: codi, nom, comarca, poblacio, geom (polygon, EPSG:25831).
Never query tables outside this list, system catalogs, or tables whose name starts with tmp_ or bkp_.

COLUMN MEANING
- descarregues.format is the file format requested, not the format of the source data.
- canal is how the request arrived: web (visor and catalogue pages) or api (WMS, WFS and REST clients).
- usuari_tipus distinguishes anonymous visitors from registered users; "users" with no qualifier means all rows.
- recursos.categoria is the publishing category; recursos.tematica is the subject area. They overlap in wording but are different fields.

VALID VALUES
Filter categorical columns only with these exact values:
- format: 'SHP', 'GeoJSON', 'GPKG', 'DXF', 'CSV', 'XLSX', 'PDF', 'KML'
- idioma: 'ca', 'es', 'en'
- canal: 'web', 'api'
- usuari_tipus: 'anonim', 'registrat'
- categoria: 'Cartografia', 'Ortofotos', 'Planejament', 'Mobilitat', 'Medi ambient', 'Equipaments', 'Estadistica'
- tematica: 'Urbanisme', 'Transport', 'Habitatge', 'Territori', 'Energia', 'Residus', 'Aigua'

FUZZY MATCHING
When the question names a value that is close to a valid one (different case, accents, a plural, a translation, a common abbreviation such as "shapefile" for 'SHP' or "Catalan" for 'ca'), map it to the nearest valid value and filter on that value.
Never invent a value outside the lists above. If no valid value is close, do not filter on that column.
Municipality names are matched with ILIKE against municipis.nom, never with equality.

CATEGORY OR THEME
If a term appears both as a categoria and as a tematica value, prefer categoria when the question talks about "type of data" or "product", and tematica when it talks about "subject" or "topic". If the question is ambiguous, filter on categoria.

JOINS
- Any question about a resource title, category, theme or publisher joins descarregues or visualitzacions to recursos on recurs_id = recursos.id.
- Any question by municipality name, county (comarca) or population joins to municipis on municipi_codi = municipis.codi.
- Count downloads with COUNT(*) over descarregues, never by counting resources.

SPATIAL
- When the answer is naturally shown on a map (per municipality, per county, "where"), include municipis.geom in the select list alongside the grouping columns.
- Apply a spatial containment predicate (ST_Contains, ST_Intersects, ST_Within) once, at the outermost level that needs it. Never repeat the same spatial join inside nested subqueries or CTEs.
- Do not compute areas or distances unless the question asks for them.

DATES
- data_hora is stored in local time. "Last month" and "this year" are relative to CURRENT_DATE.
- Group by month with date_trunc('month', data_hora)."#;

/// Loads instruction text following config priority: file > inline > default.
///
/// An unreadable or empty file logs a warning and falls back.
pub async fn load_instructions(config: &AgentConfig) -> Result<String, GeoaskError> {
    if let Some(ref path) = config.instructions_file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    info!(path = path.as_str(), "loaded instructions from file");
                    return Ok(trimmed.to_string());
                }
                warn!(path = path.as_str(), "instructions file is empty, falling back");
            }
            Err(e) => {
                warn!(
                    path = path.as_str(),
                    error = %e,
                    "failed to read instructions file, falling back"
                );
            }
        }
    }

    if let Some(ref text) = config.instructions
        && !text.trim().is_empty()
    {
        return Ok(text.clone());
    }

    Ok(GEOPORTAL_RULEBOOK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rulebook_covers_enumerations_and_spatial_rules() {
        assert!(GEOPORTAL_RULEBOOK.contains("VALID VALUES"));
        assert!(GEOPORTAL_RULEBOOK.contains("'GeoJSON'"));
        assert!(GEOPORTAL_RULEBOOK.contains("FUZZY MATCHING"));
        assert!(GEOPORTAL_RULEBOOK.contains("Never repeat the same spatial join"));
    }

    #[tokio::test]
    async fn default_is_rulebook() {
        let text = load_instructions(&AgentConfig::default()).await.unwrap();
        assert_eq!(text, GEOPORTAL_RULEBOOK);
    }

    #[tokio::test]
    async fn inline_overrides_default() {
        let config = AgentConfig {
            instructions: Some("Only use table t.".into()),
            ..Default::default()
        };
        assert_eq!(load_instructions(&config).await.unwrap(), "Only use table t.");
    }

    #[tokio::test]
    async fn file_overrides_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.md");
        std::fs::write(&path, "\nFrom file.\n").unwrap();

        let config = AgentConfig {
            instructions: Some("Inline.".into()),
            instructions_file: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        assert_eq!(load_instructions(&config).await.unwrap(), "From file.");
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_inline() {
        let config = AgentConfig {
            instructions: Some("Inline.".into()),
            instructions_file: Some("/nonexistent/geoask/rules.md".into()),
            ..Default::default()
        };
        assert_eq!(load_instructions(&config).await.unwrap(), "Inline.");
    }
}
