//! Printer configuration and the human-readable option lookup tables.

use std::fmt;

/// The printer model, which selects a handful of command-encoding
/// differences (see [`crate::command`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// PagePro 1200W / 1250W.
    M1200W,
    /// PagePro 1300W / 1350W.
    M1300W,
    /// PagePro 1400W.
    M1400W,
}

impl Model {
    /// The byte value this model is identified by on the wire.
    pub fn code(self) -> u8 {
        match self {
            Model::M1200W => 0x81,
            Model::M1300W => 0x83,
            Model::M1400W => 0x86,
        }
    }

    /// `true` for the models that need the `0x1C`/`0x04` command variants
    /// instead of the `0x78`/`0x00` ones.
    pub fn is_1300_series_or_newer(self) -> bool {
        matches!(self, Model::M1300W | Model::M1400W)
    }

    fn from_name(name: &str) -> Option<Model> {
        match name.to_ascii_uppercase().as_str() {
            "1200W" | "1250W" => Some(Model::M1200W),
            "1300W" | "1350W" => Some(Model::M1300W),
            "1400W" => Some(Model::M1400W),
            _ => None,
        }
    }

    /// Preselects a model from the executable's basename, the way the
    /// original filter let itself be installed under `min1200w`,
    /// `min1250w`, ..., `min1400w` symlinks.
    pub fn from_argv0(argv0: &str) -> Option<Model> {
        let suffix_start = argv0.len().checked_sub(8)?;
        match &argv0[suffix_start..] {
            "min1200w" | "min1250w" => Some(Model::M1200W),
            "min1300w" | "min1350w" => Some(Model::M1300W),
            "min1400w" => Some(Model::M1400W),
            _ => None,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Model::M1200W => "1200W",
            Model::M1300W => "1300W",
            Model::M1400W => "1400W",
        };
        write!(f, "{}", s)
    }
}

/// Print resolution. The low byte of [`Resolution::code`] indexes
/// [`crate::MARGIN_TABLE`]; `Res1200x600` intentionally shares the
/// `Res600` margin entry because both have low byte `0x01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 300x300 dpi.
    Res300,
    /// 600x600 dpi.
    Res600,
    /// 1200x1200 dpi.
    Res1200,
    /// 1200x600 dpi (doubled vertical resolution only).
    Res1200x600,
}

impl Resolution {
    /// The 16-bit code sent in the start-job command, split little-endian.
    pub fn code(self) -> u16 {
        match self {
            Resolution::Res300 => 0x0000,
            Resolution::Res600 => 0x0001,
            Resolution::Res1200 => 0x0002,
            Resolution::Res1200x600 => 0x0101,
        }
    }

    fn from_name(name: &str) -> Option<Resolution> {
        match name {
            "300" | "300x300" => Some(Resolution::Res300),
            "600" | "600x600" => Some(Resolution::Res600),
            "1200" | "1200x1200" => Some(Resolution::Res1200),
            "1200x600" => Some(Resolution::Res1200x600),
            _ => None,
        }
    }

    /// Dots per inch along each axis, used to print physical page size.
    pub fn dpi(self) -> (f64, f64) {
        match self {
            Resolution::Res300 => (300.0, 300.0),
            Resolution::Res600 => (600.0, 600.0),
            Resolution::Res1200 => (1200.0, 1200.0),
            Resolution::Res1200x600 => (1200.0, 600.0),
        }
    }
}

/// Paper tray selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tray {
    /// Automatic tray selection (the default).
    Auto,
    /// First tray.
    Tray1,
    /// Second tray.
    Tray2,
    /// Manual feed.
    Manual,
}

impl Tray {
    /// The byte value sent in the new-page command.
    pub fn code(self) -> u8 {
        match self {
            Tray::Auto => 0xff,
            Tray::Tray1 => 0x00,
            Tray::Tray2 => 0x01,
            Tray::Manual => 0x80,
        }
    }

    fn from_name(name: &str) -> Option<Tray> {
        match name {
            "auto" => Some(Tray::Auto),
            "tray1" => Some(Tray::Tray1),
            "tray2" => Some(Tray::Tray2),
            "manual" => Some(Tray::Manual),
            _ => None,
        }
    }
}

/// Paper type (media) selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperType {
    /// Plain paper (the default).
    Normal,
    /// Card stock / thick media.
    Thick,
    /// Transparency film.
    Transparency,
    /// Postcard or envelope stock (the device encodes both the same way).
    PostcardOrEnvelope,
}

impl PaperType {
    /// The byte value sent in the start-job command.
    pub fn code(self) -> u8 {
        match self {
            PaperType::Normal => 0x00,
            PaperType::Thick => 0x01,
            PaperType::Transparency => 0x02,
            PaperType::PostcardOrEnvelope => 0x03,
        }
    }

    fn from_name(name: &str) -> Option<PaperType> {
        match name {
            "normal" => Some(PaperType::Normal),
            "thick" => Some(PaperType::Thick),
            "transparency" => Some(PaperType::Transparency),
            "postcard" | "envelope" => Some(PaperType::PostcardOrEnvelope),
            _ => None,
        }
    }
}

/// Paper format (size) selector. Several Japanese envelope/card formats
/// share code `0x31` on the original device, same as here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperFormat(u8);

impl PaperFormat {
    const TABLE: &'static [(&'static str, u8)] = &[
        ("a4", 0x04),
        ("b5", 0x06),
        ("a5", 0x08),
        ("jpost", 0x0c),
        ("corpost", 0x0d),
        ("jisy6", 0x10),
        ("jisy0", 0x11),
        ("chinese16k", 0x13),
        ("chinese32k", 0x15),
        ("legal", 0x19),
        ("glegal", 0x1a),
        ("letter", 0x1b),
        ("gletter", 0x1d),
        ("executive", 0x1f),
        ("halfletter", 0x21),
        ("envmonarch", 0x24),
        ("env10", 0x25),
        ("envdl", 0x26),
        ("envc5", 0x27),
        ("envc6", 0x28),
        ("envb5", 0x29),
        ("choukei3gou", 0x2d),
        ("choukei5gou", 0x2e),
        ("custom", 0x31),
        ("envb6", 0x31),
        ("folio", 0x31),
        ("jisy1", 0x31),
        ("jisy2", 0x31),
        ("quadpost", 0x31),
    ];

    /// The default paper format, `a4`.
    pub const DEFAULT: PaperFormat = PaperFormat(0x04);

    /// The byte value sent in the new-page command.
    pub fn code(self) -> u8 {
        self.0
    }

    fn from_name(name: &str) -> Option<PaperFormat> {
        Self::TABLE
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(name))
            .map(|(_, id)| PaperFormat(*id))
    }

    /// All recognized format names, in table order, for `--help` output.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::TABLE.iter().map(|(s, _)| *s)
    }
}

/// Non-fatal configuration problems: an unrecognized option value. The
/// caller logs the message and substitutes the default rather than
/// aborting, matching the original filter's `getid()` fallback behavior.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// What kind of value was being looked up (e.g. `"paper format"`).
    pub kind: &'static str,
    /// The value the user supplied.
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ConfigError {}

fn lookup<T>(
    kind: &'static str,
    value: &str,
    from_name: impl Fn(&str) -> Option<T>,
    default: T,
) -> (T, Option<ConfigError>) {
    match from_name(value) {
        Some(parsed) => (parsed, None),
        None => (
            default,
            Some(ConfigError {
                kind,
                value: value.to_string(),
            }),
        ),
    }
}

/// Resolves a model name, falling back to `1200W` on an unknown value.
pub fn resolve_model(value: &str) -> (Model, Option<ConfigError>) {
    lookup("printer model", value, Model::from_name, Model::M1200W)
}

/// Resolves a resolution name, falling back to 600 dpi on an unknown value.
pub fn resolve_resolution(value: &str) -> (Resolution, Option<ConfigError>) {
    lookup(
        "resolution",
        value,
        Resolution::from_name,
        Resolution::Res600,
    )
}

/// Resolves a tray name, falling back to `auto` on an unknown value.
pub fn resolve_tray(value: &str) -> (Tray, Option<ConfigError>) {
    lookup("tray", value, Tray::from_name, Tray::Auto)
}

/// Resolves a paper type name, falling back to `normal` on an unknown value.
pub fn resolve_paper_type(value: &str) -> (PaperType, Option<ConfigError>) {
    lookup("paper type", value, PaperType::from_name, PaperType::Normal)
}

/// Resolves a paper format name, falling back to `a4` on an unknown value.
pub fn resolve_paper_format(value: &str) -> (PaperFormat, Option<ConfigError>) {
    lookup(
        "paper format",
        value,
        PaperFormat::from_name,
        PaperFormat::DEFAULT,
    )
}

/// The fully resolved configuration for one filter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Target printer model.
    pub model: Model,
    /// Print resolution.
    pub resolution: Resolution,
    /// Paper tray.
    pub tray: Tray,
    /// Paper/media type.
    pub paper_type: PaperType,
    /// Paper format (size).
    pub paper_format: PaperFormat,
    /// Whether non-printable margins are enforced.
    pub margins_enabled: bool,
    /// Toner-saving mode (blanks every other scanline).
    pub ecomode: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            model: Model::M1200W,
            resolution: Resolution::Res600,
            tray: Tray::Auto,
            paper_type: PaperType::Normal,
            paper_format: PaperFormat::DEFAULT,
            margins_enabled: true,
            ecomode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_paper_format_falls_back_to_default() {
        let (format, err) = resolve_paper_format("does-not-exist");
        assert_eq!(format, PaperFormat::DEFAULT);
        assert!(err.is_some());
    }

    #[test]
    fn known_paper_format_resolves_without_error() {
        let (format, err) = resolve_paper_format("legal");
        assert_eq!(format.code(), 0x19);
        assert!(err.is_none());
    }

    #[test]
    fn shared_codes_in_paper_format_table() {
        let (custom, _) = resolve_paper_format("custom");
        let (folio, _) = resolve_paper_format("folio");
        assert_eq!(custom.code(), folio.code());
    }

    #[test]
    fn model_suffix_detection() {
        assert_eq!(Model::from_argv0("/usr/bin/min1200w"), Some(Model::M1200W));
        assert_eq!(Model::from_argv0("/usr/bin/min1400w"), Some(Model::M1400W));
        assert_eq!(Model::from_argv0("/usr/bin/lpfilter"), None);
        assert_eq!(Model::from_argv0("x"), None);
    }

    #[test]
    fn resolution_low_byte_shared_by_1200x600_and_600() {
        assert_eq!(
            Resolution::Res1200x600.code() & 0xff,
            Resolution::Res600.code() & 0xff
        );
    }

    #[test]
    fn default_config_matches_original_filter_defaults() {
        let cfg = PrinterConfig::default();
        assert_eq!(cfg.model, Model::M1200W);
        assert_eq!(cfg.resolution, Resolution::Res600);
        assert_eq!(cfg.tray, Tray::Auto);
        assert_eq!(cfg.paper_type, PaperType::Normal);
        assert_eq!(cfg.paper_format.code(), 0x04);
        assert!(cfg.margins_enabled);
        assert!(!cfg.ecomode);
    }
}
