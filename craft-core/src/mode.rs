//! Craft disciplines and their static configuration tables.
//!
//! Each craft mode carries an ordered set of stages and an ordered set of
//! material types. The tables are compiled in and never persisted; stored
//! records refer to stages by value and to material types by id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stage value shared by every mode for ideas that have not been started.
pub const INSPIRATION_STAGE: &str = "灵感";
/// Stage value shared by every mode for finished portfolio pieces.
pub const FINAL_STAGE: &str = "成品";
/// Stage value shared by every mode for abandoned work.
pub const DISCARDED_STAGE: &str = "放弃";

/// Error returned when a craft mode name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown craft mode: {0}")]
pub struct UnknownMode(pub String);

/// A creative discipline with its own stage and material taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftMode {
    #[default]
    Pottery,
    Woodwork,
    Metalwork,
    Weaving,
    Glass,
    Leather,
}

impl CraftMode {
    /// All modes in menu order.
    pub const ALL: [CraftMode; 6] = [
        CraftMode::Pottery,
        CraftMode::Woodwork,
        CraftMode::Metalwork,
        CraftMode::Weaving,
        CraftMode::Glass,
        CraftMode::Leather,
    ];

    /// Stable ASCII identifier used in store keys.
    pub fn slug(&self) -> &'static str {
        match self {
            CraftMode::Pottery => "pottery",
            CraftMode::Woodwork => "woodwork",
            CraftMode::Metalwork => "metalwork",
            CraftMode::Weaving => "weaving",
            CraftMode::Glass => "glass",
            CraftMode::Leather => "leather",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            CraftMode::Pottery => "陶艺",
            CraftMode::Woodwork => "木作",
            CraftMode::Metalwork => "金工",
            CraftMode::Weaving => "编织",
            CraftMode::Glass => "玻璃",
            CraftMode::Leather => "皮具",
        }
    }

    /// The static configuration for this mode.
    pub fn config(&self) -> &'static ModeConfig {
        match self {
            CraftMode::Pottery => &POTTERY,
            CraftMode::Woodwork => &WOODWORK,
            CraftMode::Metalwork => &METALWORK,
            CraftMode::Weaving => &WEAVING,
            CraftMode::Glass => &GLASS,
            CraftMode::Leather => &LEATHER,
        }
    }

    /// The mode after this one in menu order, wrapping around.
    pub fn next(&self) -> CraftMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for CraftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CraftMode {
    type Err = UnknownMode;

    /// Accepts the slug (any case) or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.slug().eq_ignore_ascii_case(trimmed) || m.label() == trimmed)
            .ok_or_else(|| UnknownMode(trimmed.to_string()))
    }
}

/// How a stage participates in the derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Inspiration,
    Working,
    Final,
    Discarded,
}

/// One legal stage of a craft mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDef {
    /// Stored value and display label.
    pub value: &'static str,
    /// ASCII alias accepted on the command line.
    pub slug: &'static str,
    /// Material Symbols icon name.
    pub icon: &'static str,
    pub kind: StageKind,
}

/// One legal material type of a craft mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialTypeDef {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Static, read-only configuration of a craft mode.
#[derive(Debug)]
pub struct ModeConfig {
    pub stages: &'static [StageDef],
    pub material_types: &'static [MaterialTypeDef],
}

impl ModeConfig {
    /// Look up a stage by value or slug.
    pub fn stage(&self, name: &str) -> Option<&'static StageDef> {
        let name = name.trim();
        self.stages
            .iter()
            .find(|s| s.value == name || s.slug.eq_ignore_ascii_case(name))
    }

    /// Look up a material type by id or label.
    pub fn material_type(&self, id: &str) -> Option<&'static MaterialTypeDef> {
        let id = id.trim();
        self.material_types
            .iter()
            .find(|t| t.id.eq_ignore_ascii_case(id) || t.label == id)
    }

    /// The stage a new entry starts in.
    pub fn default_stage(&self) -> &'static StageDef {
        &self.stages[0]
    }

    /// The material type a new material starts with.
    pub fn default_material_type(&self) -> &'static MaterialTypeDef {
        &self.material_types[0]
    }

    /// The kind of a stored stage value. Unknown values count as working stages.
    pub fn stage_kind(&self, value: &str) -> StageKind {
        self.stages
            .iter()
            .find(|s| s.value == value)
            .map(|s| s.kind)
            .unwrap_or(StageKind::Working)
    }

    /// The stored value of the first stage with the given kind.
    pub fn stage_of_kind(&self, kind: StageKind) -> Option<&'static str> {
        self.stages.iter().find(|s| s.kind == kind).map(|s| s.value)
    }
}

const fn stage(value: &'static str, slug: &'static str, icon: &'static str, kind: StageKind) -> StageDef {
    StageDef {
        value,
        slug,
        icon,
        kind,
    }
}

const fn working(value: &'static str, slug: &'static str, icon: &'static str) -> StageDef {
    stage(value, slug, icon, StageKind::Working)
}

const fn material(id: &'static str, label: &'static str, icon: &'static str) -> MaterialTypeDef {
    MaterialTypeDef { id, label, icon }
}

const INSPIRATION: StageDef = stage(INSPIRATION_STAGE, "inspiration", "lightbulb", StageKind::Inspiration);
const FINISHED: StageDef = stage(FINAL_STAGE, "finished", "stars", StageKind::Final);
const DISCARDED: StageDef = stage(DISCARDED_STAGE, "discarded", "delete_outline", StageKind::Discarded);

static POTTERY: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("泥坯", "greenware", "texture"),
        working("素坯", "bisque", "oven"),
        working("上釉中", "glazing", "format_paint"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("clay", "泥料", "texture"),
        material("glaze", "釉料", "format_paint"),
        material("slip", "化妆土", "format_color_fill"),
        material("color", "颜色/色粉", "palette"),
    ],
};

static WOODWORK: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("设计·结构", "design", "architecture"),
        working("组装中", "assembly", "handyman"),
        working("表面处理", "finishing", "imagesearch_roller"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("wood", "木材", "forest"),
        material("hardware", "五金", "nut"),
        material("finish", "表面处理", "brush"),
        material("other", "其他", "category"),
    ],
};

static METALWORK: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("设计·版型", "pattern", "straighten"),
        working("成型中", "forming", "hardware"),
        working("组合", "joining", "join_inner"),
        working("表面处理", "finishing", "auto_fix_high"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("metal", "金属材料", "layers"),
        material("solder", "焊料·助焊剂", "mode_fan"),
        material("finish", "表面处理", "blur_on"),
        material("decoration", "宝石·装饰", "diamond"),
        material("other", "其他", "category"),
    ],
};

static WEAVING: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("配色·试样", "swatch", "palette"),
        working("编织中", "weaving", "waves"),
        working("成型", "shaping", "checkroom"),
        working("整理·定型", "blocking", "iron"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("yarn", "线材·纱线", "gesture"),
        material("fabric", "布料", "texture"),
        material("dye", "染料", "colorize"),
        material("accessory", "辅料", "extension"),
        material("other", "其他", "category"),
    ],
};

static GLASS: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("备料", "prep", "inventory"),
        working("成型中", "forming", "mode_heat"),
        working("冷却·退火", "annealing", "ac_unit"),
        working("后处理", "coldwork", "grid_view"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("glass", "玻璃材料", "window"),
        material("color", "颜色料", "invert_colors"),
        material("mold", "模具·支撑", "rebase_edit"),
        material("coldwork", "冷加工材料", "shutter_speed"),
        material("other", "其他", "category"),
    ],
};

static LEATHER: ModeConfig = ModeConfig {
    stages: &[
        INSPIRATION,
        working("裁切", "cutting", "content_cut"),
        working("缝制·组装", "stitching", "edit_note"),
        working("边油·整理", "edging", "ink_eraser"),
        FINISHED,
        DISCARDED,
    ],
    material_types: &[
        material("leather", "皮料", "reorder"),
        material("thread", "线材", "vaping_rooms"),
        material("hardware", "五金", "settings"),
        material("auxiliary", "辅助材料", "format_color_fill"),
        material("other", "其他", "category"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_has_the_shared_stages() {
        for mode in CraftMode::ALL {
            let config = mode.config();
            assert_eq!(config.default_stage().value, INSPIRATION_STAGE);
            assert_eq!(config.stage_of_kind(StageKind::Final), Some(FINAL_STAGE));
            assert_eq!(
                config.stage_of_kind(StageKind::Discarded),
                Some(DISCARDED_STAGE)
            );
            assert!(!config.material_types.is_empty());
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("pottery".parse::<CraftMode>(), Ok(CraftMode::Pottery));
        assert_eq!("GLASS".parse::<CraftMode>(), Ok(CraftMode::Glass));
        assert_eq!("皮具".parse::<CraftMode>(), Ok(CraftMode::Leather));
        assert_eq!(
            "origami".parse::<CraftMode>(),
            Err(UnknownMode("origami".to_string()))
        );
    }

    #[test]
    fn test_stage_lookup_by_value_or_slug() {
        let config = CraftMode::Pottery.config();
        assert_eq!(config.stage("素坯").map(|s| s.slug), Some("bisque"));
        assert_eq!(config.stage("Bisque").map(|s| s.value), Some("素坯"));
        assert!(config.stage("编织中").is_none());
    }

    #[test]
    fn test_material_type_lookup() {
        let config = CraftMode::Woodwork.config();
        assert_eq!(config.default_material_type().id, "wood");
        assert_eq!(config.material_type("五金").map(|t| t.id), Some("hardware"));
        assert!(config.material_type("clay").is_none());
    }

    #[test]
    fn test_stage_kind_of_unknown_value_is_working() {
        let config = CraftMode::Glass.config();
        assert_eq!(config.stage_kind("成型中"), StageKind::Working);
        assert_eq!(config.stage_kind("mystery"), StageKind::Working);
        assert_eq!(config.stage_kind(INSPIRATION_STAGE), StageKind::Inspiration);
    }

    #[test]
    fn test_next_wraps_around() {
        assert_eq!(CraftMode::Pottery.next(), CraftMode::Woodwork);
        assert_eq!(CraftMode::Leather.next(), CraftMode::Pottery);
    }
}
