//! Shared emitted-policy plumbing used by the Model Controller's cascade
//! cleanup and both aggregators' upsert (§4.4 step 6, §4.3 step 1).

use serde_json::Value;

use maas_core::{EmittedPolicy, LABEL_MANAGED_BY, LABEL_MODEL, MANAGED_BY_VALUE};
use maas_store::ObjectStore;

use crate::error::ControllerError;

/// Delete every emitted policy labeled `model=<name>, managed-by=us`,
/// skipping any with the `managed=false` opt-out (invariant 4).
pub async fn delete_emitted_for_model(
    store: &dyn ObjectStore<EmittedPolicy>,
    model_name: &str,
) -> Result<(), ControllerError> {
    for policy in store.list(None).await? {
        if !labeled_for(&policy, model_name) || policy.meta.is_unmanaged() {
            continue;
        }
        store.delete(&policy.meta.object_ref()).await?;
    }
    Ok(())
}

fn labeled_for(policy: &EmittedPolicy, model_name: &str) -> bool {
    policy.meta.labels.get(LABEL_MODEL).map(String::as_str) == Some(model_name)
        && policy.meta.labels.get(LABEL_MANAGED_BY).map(String::as_str) == Some(MANAGED_BY_VALUE)
}

/// §4.4 step 6 / §4.5: upsert the emitted policy for `model_name`. Skips
/// silently if an existing object opted out via `managed=false`. Merges
/// annotations (preserving unknown keys) but overwrites labels and spec
/// wholesale, matching "always rebuild the whole spec" (§9).
pub async fn upsert_emitted(
    store: &dyn ObjectStore<EmittedPolicy>,
    name: &str,
    namespace: &str,
    spec: Value,
    labels: Vec<(&str, String)>,
    contributing_annotation_key: &str,
    contributing_names: &[String],
) -> Result<(), ControllerError> {
    let key = maas_core::ObjectRef::new(name, namespace);
    let existing = store.get(&key).await?;

    if let Some(existing) = &existing {
        if existing.meta.is_unmanaged() {
            return Ok(());
        }
    }

    let annotation_value = contributing_names.join(",");

    match existing {
        Some(mut policy) => {
            policy.meta.labels.clear();
            for (k, v) in labels {
                policy.meta.labels.insert(k.to_owned(), v);
            }
            policy
                .meta
                .annotations
                .insert(contributing_annotation_key.to_owned(), annotation_value);
            policy.spec = spec;
            store.update(policy).await?;
        }
        None => {
            let mut policy = EmittedPolicy::new(name, namespace, spec);
            for (k, v) in labels {
                policy.meta.labels.insert(k.to_owned(), v);
            }
            policy
                .meta
                .annotations
                .insert(contributing_annotation_key.to_owned(), annotation_value);
            store.create(policy).await?;
        }
    }
    Ok(())
}
