/// A pair of presentation assets resolved for one behavior token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub vfx: String,
    pub sfx: String,
}

impl AssetPair {
    fn new(vfx: &str, sfx: &str) -> Self {
        Self {
            vfx: vfx.to_owned(),
            sfx: sfx.to_owned(),
        }
    }
}

/// Maps behavior tokens (keywords, hazards, statuses, mechanic suffixes) to
/// default presentation assets. The compiler consults this when normalizing
/// a rule intent; hosts can supply their own table.
pub trait AssetLexicon {
    fn resolve(&self, token: &str) -> Option<AssetPair>;
}

/// The built-in token table shipped with the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLexicon;

impl AssetLexicon for BuiltinLexicon {
    fn resolve(&self, token: &str) -> Option<AssetPair> {
        let pair = match token {
            "mine" | "bomb" | "explosion" | "explode" => {
                AssetPair::new("vfx_explosion", "sfx_explosion")
            }
            "teleport" | "blink" | "portal" => AssetPair::new("vfx_portal", "sfx_warp"),
            "freeze" | "frozen" | "ice" => AssetPair::new("vfx_frost", "sfx_freeze"),
            "fire" | "burn" | "burning" => AssetPair::new("vfx_flames", "sfx_fire"),
            "shield" | "protect" | "protected" => AssetPair::new("vfx_shield", "sfx_shield"),
            "poison" | "poisoned" | "venom" => AssetPair::new("vfx_poison_cloud", "sfx_hiss"),
            "lightning" | "storm" | "shock" => AssetPair::new("vfx_lightning", "sfx_thunder"),
            "ghost" | "phase" | "invisible" => AssetPair::new("vfx_fade", "sfx_whoosh"),
            "swap" | "switch" => AssetPair::new("vfx_swirl", "sfx_swap"),
            "promote" | "crown" => AssetPair::new("vfx_crown", "sfx_fanfare"),
            "custom" => AssetPair::new("vfx_sparkle", "sfx_chime"),
            _ => return None,
        };
        Some(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_hazard_tokens() {
        let pair = BuiltinLexicon.resolve("mine").unwrap();
        assert_eq!(pair.vfx, "vfx_explosion");
        assert_eq!(pair.sfx, "sfx_explosion");
    }

    #[test]
    fn synonyms_share_assets() {
        assert_eq!(
            BuiltinLexicon.resolve("bomb"),
            BuiltinLexicon.resolve("explosion")
        );
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        assert_eq!(BuiltinLexicon.resolve("quux"), None);
    }
}
