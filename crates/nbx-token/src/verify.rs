use nbx_bundle::Manifest;
use nbx_types::{Address, SlotKind, Token, TokenLevel};
use tracing::warn;

use crate::deriver::{
    application_token, component_token, leaf_token, module_set_token, slot_index,
    web_application_token,
};
use crate::error::{TokenError, TokenResult};
use crate::tokens::EntryTokens;

fn check(level: TokenLevel, expected: Token, found: Token) -> TokenResult<()> {
    if expected == found {
        return Ok(());
    }
    warn!(
        %level,
        expected = %expected.short_hex(),
        found = %found.short_hex(),
        "token mismatch"
    );
    Err(TokenError::InvalidToken {
        level,
        expected,
        found,
    })
}

fn resolved_addresses(manifest: &Manifest) -> TokenResult<Vec<Address>> {
    manifest
        .slots
        .iter()
        .map(|slot| {
            slot.location.address().ok_or_else(|| TokenError::Unresolved {
                slot: slot.name.clone(),
            })
        })
        .collect()
}

/// Recompute `tokens` from a resolved manifest, bottom-up.
///
/// Fails at the first level whose stored token differs from the recomputed
/// one. Declared child tokens of nested bundles are taken as given; checking
/// them against the child entries needs the ledger.
pub fn verify(manifest: &Manifest, tokens: &EntryTokens) -> TokenResult<()> {
    if tokens.kind() != manifest.kind {
        return Err(TokenError::ShapeMismatch {
            reason: format!(
                "{} tokens for a {} manifest",
                tokens.kind(),
                manifest.kind
            ),
        });
    }
    let addresses = resolved_addresses(manifest)?;

    match tokens {
        EntryTokens::Component {
            module_set,
            component,
        } => {
            let leaves: Vec<Token> = addresses.iter().map(leaf_token).collect();
            let expected_set = module_set_token(manifest, &leaves)?;
            check(TokenLevel::ModuleSet, expected_set, *module_set)?;
            check(
                TokenLevel::ComponentBundle,
                component_token(manifest, expected_set)?,
                *component,
            )
        }
        EntryTokens::Application {
            components,
            application,
        } => {
            if components.len() != manifest.slots.len() {
                return Err(TokenError::ShapeMismatch {
                    reason: format!(
                        "{} component slots but {} component tokens",
                        manifest.slots.len(),
                        components.len()
                    ),
                });
            }
            check(
                TokenLevel::Application,
                application_token(manifest, components)?,
                *application,
            )
        }
        EntryTokens::WebApplication {
            application,
            ui,
            web_application,
        } => {
            let expected_ui = leaf_token(&addresses[slot_index(manifest, SlotKind::UiAsset)?]);
            check(TokenLevel::WebApplication, expected_ui, *ui)?;
            check(
                TokenLevel::WebApplication,
                web_application_token(manifest, *application, expected_ui)?,
                *web_application,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deriver::derive;
    use nbx_bundle::Slot;
    use nbx_types::BundleKind;

    fn resolved_component() -> (Manifest, EntryTokens) {
        let manifest = Manifest::new(BundleKind::Component, "profiles")
            .with_slot(Slot::bundled("a", SlotKind::Module, "a.wasm").resolve(Address::of(b"a")))
            .with_slot(Slot::bundled("b", SlotKind::Module, "b.wasm").resolve(Address::of(b"b")));
        let leaves: Vec<Token> = manifest
            .slots
            .iter()
            .filter_map(|s| s.location.address())
            .map(|a| leaf_token(&a))
            .collect();
        let tokens = derive(&manifest, &leaves).unwrap();
        (manifest, tokens)
    }

    fn resolved_application() -> (Manifest, EntryTokens) {
        let manifest = Manifest::new(BundleKind::Application, "app")
            .with_slot(
                Slot::bundled("one", SlotKind::ComponentBundle, "one.nbx")
                    .resolve(Address::of(b"entry-one")),
            )
            .with_slot(
                Slot::bundled("two", SlotKind::ComponentBundle, "two.nbx")
                    .resolve(Address::of(b"entry-two")),
            );
        let children = [Token::from_hash([1; 32]), Token::from_hash([2; 32])];
        let tokens = derive(&manifest, &children).unwrap();
        (manifest, tokens)
    }

    #[test]
    fn derived_tokens_verify() {
        let (manifest, tokens) = resolved_component();
        verify(&manifest, &tokens).unwrap();
        let (manifest, tokens) = resolved_application();
        verify(&manifest, &tokens).unwrap();
    }

    #[test]
    fn tampered_module_set_is_named() {
        let (manifest, mut tokens) = resolved_component();
        if let EntryTokens::Component { module_set, .. } = &mut tokens {
            *module_set = Token::from_hash([0xee; 32]);
        }
        match verify(&manifest, &tokens).unwrap_err() {
            TokenError::InvalidToken { level, found, .. } => {
                assert_eq!(level, TokenLevel::ModuleSet);
                assert_eq!(found, Token::from_hash([0xee; 32]));
            }
            other => panic!("expected InvalidToken, got {other:?}"),
        }
    }

    #[test]
    fn swapped_module_address_fails_module_set() {
        let (mut manifest, tokens) = resolved_component();
        manifest.slots[0] = manifest.slots[0].resolve(Address::of(b"evil"));
        assert!(matches!(
            verify(&manifest, &tokens),
            Err(TokenError::InvalidToken {
                level: TokenLevel::ModuleSet,
                ..
            })
        ));
    }

    #[test]
    fn tampered_root_is_named() {
        let (manifest, mut tokens) = resolved_application();
        if let EntryTokens::Application { application, .. } = &mut tokens {
            *application = Token::from_hash([0; 32]);
        }
        assert!(matches!(
            verify(&manifest, &tokens),
            Err(TokenError::InvalidToken {
                level: TokenLevel::Application,
                ..
            })
        ));
    }

    #[test]
    fn unresolved_slot_is_reported() {
        let (mut manifest, tokens) = resolved_component();
        manifest.slots[1] = manifest.slots[1].inline();
        match verify(&manifest, &tokens).unwrap_err() {
            TokenError::Unresolved { slot } => assert_eq!(slot, "b"),
            other => panic!("expected Unresolved, got {other:?}"),
        }
    }

    #[test]
    fn kind_disagreement_is_a_shape_mismatch() {
        let (manifest, _) = resolved_component();
        let (_, app_tokens) = resolved_application();
        assert!(matches!(
            verify(&manifest, &app_tokens),
            Err(TokenError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn ui_tamper_is_reported_at_web_application_level() {
        let ui = Address::of(b"ui");
        let manifest = Manifest::new(BundleKind::WebApplication, "web")
            .with_slot(
                Slot::bundled("app", SlotKind::ApplicationBundle, "app.nbx")
                    .resolve(Address::of(b"app-entry")),
            )
            .with_slot(Slot::bundled("ui", SlotKind::UiAsset, "ui.zip").resolve(ui));
        let mut tokens = derive(&manifest, &[Token::from_hash([3; 32]), leaf_token(&ui)]).unwrap();
        verify(&manifest, &tokens).unwrap();

        if let EntryTokens::WebApplication { ui, .. } = &mut tokens {
            *ui = Token::from_hash([4; 32]);
        }
        assert!(matches!(
            verify(&manifest, &tokens),
            Err(TokenError::InvalidToken {
                level: TokenLevel::WebApplication,
                ..
            })
        ));
    }
}
