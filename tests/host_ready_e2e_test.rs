//! End-to-end tests driving the plugins controller through host events

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use lectern_config::PluginsConfig;
use lectern_plugin::{
    DiagnosticKind, ExtensionSet, HostEvent, MemorySink, PluginError, PluginStatus,
    PluginsController, ReaderHost,
};
use lectern_plugins::{register_bundled, AnnotationStore};

async fn wait_for_plugins_loaded(receiver: &mut broadcast::Receiver<HostEvent>) -> Result<()> {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), receiver.recv()).await??;
        if matches!(event, HostEvent::PluginsLoaded) {
            return Ok(());
        }
    }
}

/// Start a listening controller and announce a fresh reader on its channel
async fn announce_reader(
    controller: &Arc<PluginsController>,
) -> Result<(lectern_plugin::SharedHost, tokio::task::JoinHandle<()>)> {
    let listener = controller.listen();
    let mut receiver = controller.events().subscribe();

    let host = ReaderHost::shared();
    controller
        .events()
        .publish(HostEvent::ReaderInitialized(Arc::clone(&host)));
    wait_for_plugins_loaded(&mut receiver).await?;

    Ok((host, listener))
}

#[tokio::test]
async fn test_dependency_chain_through_events() -> Result<()> {
    let controller = Arc::new(PluginsController::new(PluginsConfig::default()));
    let counter = Arc::new(AtomicUsize::new(0));

    let a_counter = Arc::clone(&counter);
    controller
        .register("a", move |_, api| {
            a_counter.fetch_add(1, Ordering::SeqCst);
            api.extend_reader(ExtensionSet::new().with("value", 1u32));
            Ok(())
        })
        .await?;

    let b_counter = Arc::clone(&counter);
    controller
        .register_with_dependencies("b", ["a"], move |plugin, api| {
            let Some(value) = api.reader().extension::<u32>("a", "value").copied() else {
                return Err(plugin.fail("a did not publish its value"));
            };
            b_counter.fetch_add(1, Ordering::SeqCst);
            api.extend_reader(ExtensionSet::new().with("value", value + 1));
            Ok(())
        })
        .await?;

    let (host, listener) = announce_reader(&controller).await?;

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(controller.is_supported("a").await);
    assert!(controller.is_supported("b").await);
    assert_eq!(host.read().await.extension::<u32>("b", "value").copied(), Some(2));

    listener.abort();
    Ok(())
}

#[tokio::test]
async fn test_missing_dependency_does_not_block_others() -> Result<()> {
    let sink = Arc::new(MemorySink::new());
    let controller = Arc::new(PluginsController::builder().with_sink(sink.clone()).build());

    controller
        .register_with_dependencies("c", ["z"], |_, _| Ok(()))
        .await?;
    controller.register("standalone", |_, _| Ok(())).await?;

    let (_host, listener) = announce_reader(&controller).await?;

    let info = controller
        .plugin_info("c")
        .await
        .ok_or_else(|| anyhow!("c not registered"))?;
    assert!(info.initialized);
    assert!(!info.supported);
    assert!(info.error.unwrap_or_default().contains("'z'"));
    assert!(controller.is_supported("standalone").await);

    let failures = sink.entries_for("c");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, DiagnosticKind::Failure);

    listener.abort();
    Ok(())
}

#[tokio::test]
async fn test_plugins_loaded_follows_every_initializer() -> Result<()> {
    let controller = Arc::new(PluginsController::new(PluginsConfig::default()));
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["one", "two", "three"] {
        let order = Arc::clone(&order);
        controller
            .register(name, move |plugin, _| {
                order.lock().unwrap().push(plugin.name().to_string());
                Ok(())
            })
            .await?;
    }

    let mut receiver = controller.events().subscribe();
    controller.on_host_ready(ReaderHost::shared()).await?;

    // nothing is published until the caller yields
    assert!(receiver.try_recv().is_err());
    wait_for_plugins_loaded(&mut receiver).await?;
    assert_eq!(*order.lock().unwrap(), vec!["one", "two", "three"]);
    Ok(())
}

#[tokio::test]
async fn test_cycle_and_failure_isolation() -> Result<()> {
    let controller = Arc::new(PluginsController::new(PluginsConfig::default()));
    let cycle_runs = Arc::new(AtomicUsize::new(0));

    for (name, dependency) in [("left", "right"), ("right", "left")] {
        let runs = Arc::clone(&cycle_runs);
        controller
            .register_with_dependencies(name, [dependency], move |_, _| {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await?;
    }
    controller
        .register("broken", |_, _| panic!("initializer exploded"))
        .await?;
    controller
        .register_with_dependencies("needs_broken", ["broken"], |_, _| Ok(()))
        .await?;
    controller.register("healthy", |_, _| Ok(())).await?;

    let (_host, listener) = announce_reader(&controller).await?;

    assert_eq!(cycle_runs.load(Ordering::SeqCst), 0);
    assert_eq!(
        controller.list_plugins_by_status(PluginStatus::Failed).await.len(),
        4
    );
    assert!(controller.is_supported("healthy").await);

    let broken = controller
        .plugin_info("broken")
        .await
        .ok_or_else(|| anyhow!("broken not registered"))?;
    assert!(broken.error.unwrap_or_default().contains("initializer exploded"));

    listener.abort();
    Ok(())
}

#[tokio::test]
async fn test_second_reader_announcement_is_swallowed() -> Result<()> {
    let controller = Arc::new(PluginsController::new(PluginsConfig::default()));
    controller.register("a", |_, _| Ok(())).await?;

    let (host, listener) = announce_reader(&controller).await?;

    let mut receiver = controller.events().subscribe();
    controller
        .events()
        .publish(HostEvent::ReaderInitialized(Arc::clone(&host)));
    wait_for_plugins_loaded(&mut receiver).await?;

    assert_eq!(controller.passes().await, 1);
    assert!(!listener.is_finished());
    assert_eq!(
        controller.on_host_ready(host).await.unwrap_err(),
        PluginError::AlreadyInitialized
    );

    listener.abort();
    Ok(())
}

#[tokio::test]
async fn test_bundled_plugins_end_to_end() -> Result<()> {
    let controller = Arc::new(PluginsController::new(PluginsConfig::default()));
    register_bundled(&controller).await?;

    let (host, listener) = announce_reader(&controller).await?;

    let reader = host.read().await;
    let store = reader
        .extension::<AnnotationStore>("annotations", "store")
        .ok_or_else(|| anyhow!("annotation store missing"))?;
    store.footnotes().insert("fn-1", 7, "reference")?;
    store.annotate(7, "worth rereading", Some("fn-1"))?;

    assert_eq!(store.on_page(7).len(), 1);
    assert_eq!(controller.get_dependents("footnotes").await, vec!["annotations"]);

    listener.abort();
    Ok(())
}
