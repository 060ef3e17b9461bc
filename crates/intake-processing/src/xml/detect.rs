use anyhow::Context;
use regex::Regex;

/// Recognises system file contents inside a rendered document
#[derive(Debug, Clone)]
pub struct DisclosureDetector {
    etc_passwd: Regex,
    system_ini: Regex,
}

impl DisclosureDetector {
    pub fn new() -> anyhow::Result<Self> {
        let etc_passwd =
            Regex::new(r"(?i)\w*:\w*:\d*:\d*:\w*:.*").context("Failed to compile passwd regex")?;
        let system_ini = Regex::new(
            r"(?i)(; for 16-bit app support|drivers|mci|driver32|386enh|keyboard|boot|display)",
        )
        .context("Failed to compile system.ini regex")?;

        Ok(Self {
            etc_passwd,
            system_ini,
        })
    }

    /// At least two lines shaped like `/etc/passwd` records
    pub fn matches_etc_passwd(&self, text: &str) -> bool {
        self.etc_passwd.find_iter(text).nth(1).is_some()
    }

    /// At least two well-known `system.ini` section markers
    pub fn matches_system_ini(&self, text: &str) -> bool {
        self.system_ini.find_iter(text).nth(1).is_some()
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.matches_etc_passwd(text) || self.matches_system_ini(text)
    }
}
