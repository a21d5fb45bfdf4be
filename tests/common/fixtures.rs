//! Static blueprint corpora used across harnesses.
//!
//! Fixture numbering is stable: record `n` always has GUID `guid(n)`, so a
//! harness can refer to a record by its number without looking it up.

use super::builders::*;
use bpx_core::RawRecord;
use serde_json::json;

/// A small, interlinked corpus in the shape of a real game dump.
///
/// ```text
/// 1 Fireball ──► 2 FireballProjectile ──► 3 FireballBuff
///    │                                        ▲
///    └──► 4 EvocationSchool   5 Wizard ───────┘ (twice)
///                              └──► 99 (missing)
/// ```
pub fn campaign() -> Vec<RawRecord> {
    vec![
        RecordBuilder::new(1, "Fireball")
            .type_name("Kingmaker.UnitLogic.Abilities.Blueprints.BlueprintAbility")
            .member("m_DisplayName", "Fireball")
            .member(
                "Components",
                json!([
                    {
                        "$type": "7a3c4f1e5b6d4e2a9c8b1d0f3e2a5b6c, AbilityDeliverProjectile",
                        "m_Projectiles": [short_ref(2)],
                    },
                    {
                        "$type": "1f2e3d4c5b6a47988776655443322110, SpellComponent",
                        "m_School": composite_ref(4),
                    },
                ]),
            )
            .build(),
        RecordBuilder::new(2, "FireballProjectile")
            .type_name("Kingmaker.Blueprints.BlueprintProjectile")
            .references("m_OnHitBuff", 3)
            .member("m_Speed", 25)
            .build(),
        RecordBuilder::new(3, "FireballBuff")
            .type_name("Kingmaker.UnitLogic.Buffs.Blueprints.BlueprintBuff")
            .member("m_Flags", json!(["HiddenInUi"]))
            .build(),
        RecordBuilder::new(4, "EvocationSchool")
            .type_name("Kingmaker.Blueprints.Classes.BlueprintFeature")
            .member("m_Parent", "Blueprint:NULL:None")
            .build(),
        RecordBuilder::new(5, "Wizard")
            .type_name("Kingmaker.Blueprints.Classes.BlueprintCharacterClass")
            .references("m_SignatureBuff", 3)
            .member("m_Buffs", json!([short_ref(3), short_ref(99)]))
            .build(),
    ]
}

/// The three-record corpus where each record matches "fireball" in exactly
/// one field: name (1), type (2) and namespace (3).
pub fn fireball_fields() -> Vec<RawRecord> {
    vec![
        RecordBuilder::new(1, "Fireball").type_name("Spells.BlueprintAbility").build(),
        RecordBuilder::new(2, "Burn").type_name("Spells.Fireball").build(),
        RecordBuilder::new(3, "Ember").type_name("Fireball.BlueprintBuff").build(),
    ]
}

/// `n` records named `Record{i}` with a chain of references `i -> i+1`.
pub fn chain(n: u128) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| {
            let builder = RecordBuilder::new(i, format!("Record{i}")).member("m_Index", i as u64);
            if i < n {
                builder.references("m_Next", i + 1)
            } else {
                builder
            }
        })
        .map(RecordBuilder::build)
        .collect()
}
