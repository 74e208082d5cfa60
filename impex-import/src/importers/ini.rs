//! Ordered INI reader for Opera `search.ini` and `.win` session files

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    /// First value for `key` (case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse sections in file order; entries before the first header are dropped
pub(crate) fn parse(input: &str) -> Vec<IniSection> {
    let mut sections: Vec<IniSection> = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push(IniSection {
                name: name.trim().to_string(),
                entries: Vec::new(),
            });
            continue;
        }

        if let (Some(section), Some((key, value))) = (sections.last_mut(), line.split_once('=')) {
            section
                .entries
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    sections
}
