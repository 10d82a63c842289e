//! Fight definition loading
//!
//! Definitions are TOML files with a header (name, narrator, role group,
//! managing types) followed by `[[phase]]` tables. Loading validates the
//! roster and the phase graph so malformed files fail before the first tick.

use std::fs;
use std::path::{Path, PathBuf};

use exomech_types::FightDefinition;

use super::error::DefinitionError;
use crate::fight::PhaseGraph;

const BUNDLED_PATH: &str = "<bundled>/exomechs.toml";
const BUNDLED: &str = include_str!("../../definitions/exomechs.toml");

/// Load and validate one definition file.
pub fn load_definition(path: &Path) -> Result<FightDefinition, DefinitionError> {
    let content = fs::read_to_string(path).map_err(|source| DefinitionError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_definition(&content, path)
}

/// Parse and validate definition source. `origin` is used in errors only.
pub fn parse_definition(content: &str, origin: &Path) -> Result<FightDefinition, DefinitionError> {
    let definition: FightDefinition =
        toml::from_str(content).map_err(|source| DefinitionError::ParseToml {
            path: origin.to_path_buf(),
            source,
        })?;
    validate_definition(&definition, origin)?;
    Ok(definition)
}

/// Load every `*.toml` definition in `dir`, sorted by file name.
pub fn load_definitions_from_dir(dir: &Path) -> Result<Vec<FightDefinition>, DefinitionError> {
    let entries = fs::read_dir(dir).map_err(|source| DefinitionError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut definitions = Vec::with_capacity(paths.len());
    for path in paths {
        definitions.push(load_definition(&path)?);
        tracing::debug!(path = %path.display(), "Loaded fight definition");
    }
    Ok(definitions)
}

/// The definition shipped with the crate.
pub fn bundled_definition() -> Result<FightDefinition, DefinitionError> {
    parse_definition(BUNDLED, Path::new(BUNDLED_PATH))
}

/// Check roster consistency and build the phase graph once.
pub fn validate_definition(definition: &FightDefinition, origin: &Path) -> Result<(), DefinitionError> {
    let invalid = |reason: String| DefinitionError::InvalidDefinition {
        path: origin.to_path_buf(),
        reason,
    };

    if definition.name.trim().is_empty() {
        return Err(invalid("name is empty".into()));
    }
    if definition.role_group.is_empty() {
        return Err(invalid("role_group is empty".into()));
    }
    for (index, kind) in definition.role_group.iter().enumerate() {
        if definition.role_group[..index].contains(kind) {
            return Err(invalid(format!("{kind} listed twice in role_group")));
        }
    }
    if let Some(kind) = definition.managing.iter().find(|k| !definition.is_role_member(**k)) {
        return Err(invalid(format!("managing type {kind} is not in role_group")));
    }
    if let Some(narrator) = definition.narrator {
        if definition.is_role_member(narrator) {
            return Err(invalid(format!("narrator {narrator} cannot be a role_group member")));
        }
    }

    PhaseGraph::from_definition(definition).map_err(|source| DefinitionError::PhaseGraph {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fight::PhaseGraphError;
    use exomech_types::{ActorType, PhaseCondition};

    fn origin() -> &'static Path {
        Path::new("test.toml")
    }

    #[test]
    fn bundled_definition_is_valid() {
        let definition = bundled_definition().unwrap();
        assert_eq!(definition.narrator, Some(ActorType(10)));
        assert_eq!(definition.phases.len(), 4);
        assert_eq!(definition.phases[3].condition, PhaseCondition::AllDefeated);
    }

    #[test]
    fn bundled_definition_survives_toml_round_trip() {
        let definition = bundled_definition().unwrap();
        let written = toml::to_string(&definition).unwrap();
        assert_eq!(parse_definition(&written, origin()).unwrap(), definition);
    }

    #[test]
    fn rejects_managing_outside_role_group() {
        let src = r#"
            name = "bad"
            role_group = [1]
            managing = [1, 2]

            [[phase]]
            ordering = 0
            name = "idle"
        "#;
        let err = parse_definition(src, origin()).unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidDefinition { ref reason, .. } if reason.contains("type#2")));
    }

    #[test]
    fn rejects_narrator_in_role_group() {
        let src = r#"
            name = "bad"
            narrator = 1
            role_group = [1]

            [[phase]]
            ordering = 0
            name = "idle"
        "#;
        assert!(matches!(
            parse_definition(src, origin()),
            Err(DefinitionError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn rejects_phase_gaps() {
        let src = r#"
            name = "gap"
            role_group = [1]

            [[phase]]
            ordering = 0
            name = "idle"

            [[phase]]
            ordering = 2
            name = "late"
        "#;
        let err = parse_definition(src, origin()).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::PhaseGraph {
                source: PhaseGraphError::MissingOrdering { ordering: 1 },
                ..
            }
        ));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let err = parse_definition("name = ", origin()).unwrap_err();
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn loads_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let body = |name: &str| {
            format!("name = \"{name}\"\nrole_group = [1]\n\n[[phase]]\nordering = 0\nname = \"idle\"\n")
        };
        fs::write(dir.path().join("b.toml"), body("second")).unwrap();
        fs::write(dir.path().join("a.toml"), body("first")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let definitions = load_definitions_from_dir(dir.path()).unwrap();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_definition(Path::new("/nonexistent/fight.toml")).unwrap_err();
        assert!(matches!(err, DefinitionError::ReadFile { .. }));
    }
}
