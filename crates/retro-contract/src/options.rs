//! Core option definitions, the legacy variable format, and a frontend-side
//! option store.

use thiserror::Error;

/// Most values a single option may offer.
pub const CORE_OPTION_VALUES_MAX: usize = 128;

/// Option definition problems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum OptionsError {
    /// Option key is empty.
    #[error("option key is empty")]
    EmptyKey,
    /// Two definitions share a key.
    #[error("option {key:?} is defined twice")]
    DuplicateKey {
        /// Repeated key.
        key: String,
    },
    /// Option offers no values.
    #[error("option {key:?} has no values")]
    NoValues {
        /// Option key.
        key: String,
    },
    /// Option offers more than [`CORE_OPTION_VALUES_MAX`] values.
    #[error("option {key:?} has {count} values, at most 128 are allowed")]
    TooManyValues {
        /// Option key.
        key: String,
        /// Values offered.
        count: usize,
    },
    /// Legacy `"Description; a|b|c"` string could not be parsed.
    #[error("legacy variable {key:?} is not of the form \"Description; a|b|c\"")]
    MalformedLegacyValue {
        /// Variable key.
        key: String,
    },
    /// Re-announcement changed the option count.
    #[error("option count changed from {expected} to {actual}")]
    CountChanged {
        /// Count from the first announcement.
        expected: usize,
        /// Count in this announcement.
        actual: usize,
    },
    /// Key is not an announced option.
    #[error("option {key:?} is not defined")]
    UnknownKey {
        /// Requested key.
        key: String,
    },
    /// Value is not one of the option's values.
    #[error("{value:?} is not a value of option {key:?}")]
    UnknownValue {
        /// Option key.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// One selectable value of an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreOptionValue {
    /// Value reported through `GET_VARIABLE`.
    pub value: String,
    /// Human-readable label; the value itself is shown when absent.
    pub label: Option<String>,
}

impl CoreOptionValue {
    /// Value without a separate label.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    /// Value with a display label.
    #[must_use]
    pub fn labelled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }

    /// Text to display for this value.
    #[must_use]
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// One core option as announced with `SET_CORE_OPTIONS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreOptionDefinition {
    /// Stable key, usually prefixed with the core name.
    pub key: String,
    /// Short description.
    pub desc: String,
    /// Longer help text.
    pub info: Option<String>,
    /// Allowed values, first one is the fallback default.
    pub values: Vec<CoreOptionValue>,
    /// Default value; ignored when it names none of `values`.
    pub default_value: Option<String>,
}

impl CoreOptionDefinition {
    /// Checks key and value count.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::EmptyKey`], [`OptionsError::NoValues`] or
    /// [`OptionsError::TooManyValues`].
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.key.is_empty() {
            return Err(OptionsError::EmptyKey);
        }
        if self.values.is_empty() {
            return Err(OptionsError::NoValues {
                key: self.key.clone(),
            });
        }
        if self.values.len() > CORE_OPTION_VALUES_MAX {
            return Err(OptionsError::TooManyValues {
                key: self.key.clone(),
                count: self.values.len(),
            });
        }
        Ok(())
    }

    /// Default value actually in effect.
    ///
    /// A missing or unmatched default falls back to the first value.
    #[must_use]
    pub fn effective_default(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .filter(|default| self.accepts(default))
            .or_else(|| self.values.first().map(|value| value.value.as_str()))
    }

    /// Returns `true` when `value` is one of the option's values.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.values.iter().any(|candidate| candidate.value == value)
    }
}

/// Validates a full option set: every definition and key uniqueness.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_definitions(definitions: &[CoreOptionDefinition]) -> Result<(), OptionsError> {
    for (index, definition) in definitions.iter().enumerate() {
        definition.validate()?;
        if definitions[..index]
            .iter()
            .any(|earlier| earlier.key == definition.key)
        {
            return Err(OptionsError::DuplicateKey {
                key: definition.key.clone(),
            });
        }
    }
    Ok(())
}

/// Options with translations, as announced with `SET_CORE_OPTIONS_INTL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreOptionsIntl {
    /// Definitions in US English; the authoritative option set.
    pub us: Vec<CoreOptionDefinition>,
    /// Translations for the user's language, matched by key.
    pub local: Option<Vec<CoreOptionDefinition>>,
}

impl CoreOptionsIntl {
    /// Merges the translation over the US set.
    ///
    /// Descriptions, help text and value labels come from the translation
    /// when it defines the same key and value; keys, values and defaults
    /// always come from the US set.
    #[must_use]
    pub fn resolve(&self) -> Vec<CoreOptionDefinition> {
        let Some(local) = &self.local else {
            return self.us.clone();
        };
        self.us
            .iter()
            .map(|us| {
                let Some(translated) = local.iter().find(|candidate| candidate.key == us.key)
                else {
                    return us.clone();
                };
                let values = us
                    .values
                    .iter()
                    .map(|value| {
                        let label = translated
                            .values
                            .iter()
                            .find(|candidate| candidate.value == value.value)
                            .and_then(|candidate| candidate.label.clone())
                            .or_else(|| value.label.clone());
                        CoreOptionValue {
                            value: value.value.clone(),
                            label,
                        }
                    })
                    .collect();
                CoreOptionDefinition {
                    key: us.key.clone(),
                    desc: if translated.desc.is_empty() {
                        us.desc.clone()
                    } else {
                        translated.desc.clone()
                    },
                    info: translated.info.clone().or_else(|| us.info.clone()),
                    values,
                    default_value: us.default_value.clone(),
                }
            })
            .collect()
    }
}

/// Visibility change for one option (`SET_CORE_OPTIONS_DISPLAY`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreOptionDisplay {
    /// Option key.
    pub key: String,
    /// Show (`true`) or hide the option in menus.
    pub visible: bool,
}

/// Option in the legacy `SET_VARIABLES` form: `"Description; a|b|c"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LegacyVariable {
    /// Option key.
    pub key: String,
    /// Description and `|`-separated values; the first value is the default.
    pub value: String,
}

impl LegacyVariable {
    /// Builds the legacy form of a definition.
    #[must_use]
    pub fn from_definition(definition: &CoreOptionDefinition) -> Self {
        let mut values: Vec<&str> = definition
            .values
            .iter()
            .map(|value| value.value.as_str())
            .collect();
        if let Some(default) = definition.effective_default() {
            if let Some(position) = values.iter().position(|value| *value == default) {
                let default = values.remove(position);
                values.insert(0, default);
            }
        }
        Self {
            key: definition.key.clone(),
            value: format!("{}; {}", definition.desc, values.join("|")),
        }
    }

    /// Parses the legacy string into a definition.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::MalformedLegacyValue`] when the `"; "`
    /// separator is missing or no value follows it.
    pub fn parse(&self) -> Result<CoreOptionDefinition, OptionsError> {
        let malformed = || OptionsError::MalformedLegacyValue {
            key: self.key.clone(),
        };
        let (desc, values) = self.value.split_once("; ").ok_or_else(malformed)?;
        let values: Vec<CoreOptionValue> = values
            .split('|')
            .filter(|value| !value.is_empty())
            .map(CoreOptionValue::new)
            .collect();
        if values.is_empty() {
            return Err(malformed());
        }
        let definition = CoreOptionDefinition {
            key: self.key.clone(),
            desc: desc.to_owned(),
            info: None,
            default_value: values.first().map(|value| value.value.clone()),
            values,
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// Frontend-side option state: definitions, selections, visibility and the
/// pending-update flag behind `GET_VARIABLE_UPDATE`.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    entries: Vec<StoredOption>,
    announced: Option<usize>,
    updated: bool,
}

#[derive(Debug, Clone)]
struct StoredOption {
    definition: CoreOptionDefinition,
    selected: String,
    visible: bool,
}

impl OptionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts an announcement.
    ///
    /// The first announcement fixes the option count. Later announcements
    /// must keep it; selections survive when the value is still offered.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::CountChanged`] or a validation error; the
    /// store is unchanged on error.
    pub fn announce(&mut self, definitions: &[CoreOptionDefinition]) -> Result<(), OptionsError> {
        validate_definitions(definitions)?;
        if let Some(expected) = self.announced {
            if expected != definitions.len() {
                return Err(OptionsError::CountChanged {
                    expected,
                    actual: definitions.len(),
                });
            }
        }
        let entries = definitions
            .iter()
            .map(|definition| {
                let previous = self
                    .entries
                    .iter()
                    .find(|entry| entry.definition.key == definition.key);
                let selected = previous
                    .map(|entry| entry.selected.as_str())
                    .filter(|selected| definition.accepts(selected))
                    .or_else(|| definition.effective_default())
                    .unwrap_or_default()
                    .to_owned();
                StoredOption {
                    definition: definition.clone(),
                    selected,
                    visible: previous.is_none_or(|entry| entry.visible),
                }
            })
            .collect();
        self.entries = entries;
        self.announced = Some(definitions.len());
        Ok(())
    }

    /// Accepts a legacy announcement.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the first malformed variable, or any
    /// [`OptionStore::announce`] error.
    pub fn announce_legacy(&mut self, variables: &[LegacyVariable]) -> Result<(), OptionsError> {
        let definitions = variables
            .iter()
            .map(LegacyVariable::parse)
            .collect::<Result<Vec<_>, _>>()?;
        self.announce(&definitions)
    }

    /// Number of options fixed by the first announcement.
    #[must_use]
    pub const fn announced_count(&self) -> Option<usize> {
        self.announced
    }

    /// Current value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|entry| entry.selected.as_str())
    }

    /// Selects a value and raises the update flag when it changed.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::UnknownKey`] or [`OptionsError::UnknownValue`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), OptionsError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.definition.key == key)
            .ok_or_else(|| OptionsError::UnknownKey {
                key: key.to_owned(),
            })?;
        if !entry.definition.accepts(value) {
            return Err(OptionsError::UnknownValue {
                key: key.to_owned(),
                value: value.to_owned(),
            });
        }
        if entry.selected != value {
            value.clone_into(&mut entry.selected);
            self.updated = true;
        }
        Ok(())
    }

    /// Applies a visibility change. Unknown keys are ignored.
    pub fn set_visible(&mut self, display: &CoreOptionDisplay) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.definition.key == display.key)
        {
            entry.visible = display.visible;
        }
    }

    /// Returns `true` when `key` is shown in menus.
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        self.entry(key).is_some_and(|entry| entry.visible)
    }

    /// Reads and clears the update flag.
    pub fn take_update(&mut self) -> bool {
        std::mem::take(&mut self.updated)
    }

    /// Definitions in announcement order.
    pub fn definitions(&self) -> impl Iterator<Item = &CoreOptionDefinition> {
        self.entries.iter().map(|entry| &entry.definition)
    }

    fn entry(&self, key: &str) -> Option<&StoredOption> {
        self.entries
            .iter()
            .find(|entry| entry.definition.key == key)
    }
}
