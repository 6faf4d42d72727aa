use crate::domain::catalog;
use crate::error::Result;

use super::dto::PresetDto;

pub fn list_presets() -> Result<Vec<PresetDto>> {
    Ok(catalog()?.iter().map(PresetDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_catalog_in_order() {
        let presets = list_presets().unwrap();
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Focus (10 Hz)",
                "Relax (6 Hz)",
                "Sleep (2 Hz)",
                "Meditation (7.83 Hz)"
            ]
        );
        assert_eq!(presets[0].left_hz, 220.0);
        assert_eq!(presets[0].right_hz, 230.0);
    }
}
