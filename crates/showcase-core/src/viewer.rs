//! Viewer scene lifecycle and host shell
//!
//! A mounted [`ViewerScene`] owns exactly one in-flight model load. Each call
//! to [`ViewerScene::frame`] polls that load without blocking and composes
//! the frame. Unmounting aborts the load task and drops the receiving end,
//! so a late result never reaches the scene.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::asset::{AssetLoadError, AssetLoader, LoadOutcome, LoadState};
use crate::config::{AnimationConfig, HeroMode, ShowcaseConfig};
use crate::scene::{compose, FrameGraph, ModelNode, ModelTransform};

/// Lifecycle of one viewer scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    Unmounted,
    Mounting,
    /// Model load in flight, the suspension boundary shows its fallback
    Pending,
    /// Model presented, controls live
    Interactive,
    /// Terminal for this mount, remount to retry
    Failed,
}

struct PendingLoad {
    result: oneshot::Receiver<LoadOutcome>,
    task: JoinHandle<()>,
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Continuous spin about the vertical axis, one fixed step per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRotate {
    pub radians_per_frame: f32,
}

impl AutoRotate {
    /// `None` unless enabled in the animation config
    pub fn from_config(config: &AnimationConfig) -> Option<Self> {
        config.auto_rotate.then_some(Self {
            radians_per_frame: config.radians_per_frame,
        })
    }

    pub fn step(&self, transform: &mut ModelTransform) {
        transform.yaw += self.radians_per_frame;
    }
}

pub struct ViewerScene {
    config: ShowcaseConfig,
    loader: AssetLoader,
    phase: ScenePhase,
    pending: Option<PendingLoad>,
    model: Option<ModelNode>,
    failure: Option<AssetLoadError>,
    auto_rotate: Option<AutoRotate>,
}

impl ViewerScene {
    pub fn new(config: ShowcaseConfig, loader: AssetLoader) -> Self {
        let auto_rotate = AutoRotate::from_config(&config.animation);
        Self {
            config,
            loader,
            phase: ScenePhase::Unmounted,
            pending: None,
            model: None,
            failure: None,
            auto_rotate,
        }
    }

    pub fn config(&self) -> &ShowcaseConfig {
        &self.config
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Load state of the model for the current mount
    pub fn load_state(&self) -> Option<LoadState> {
        match self.phase {
            ScenePhase::Unmounted | ScenePhase::Mounting => None,
            ScenePhase::Pending => Some(LoadState::Pending),
            ScenePhase::Interactive => Some(LoadState::Ready),
            ScenePhase::Failed => Some(LoadState::Failed),
        }
    }

    pub fn model(&self) -> Option<&ModelNode> {
        self.model.as_ref()
    }

    pub fn failure(&self) -> Option<&AssetLoadError> {
        self.failure.as_ref()
    }

    /// Start the model load. Must be called from within a tokio runtime.
    pub fn mount(&mut self) {
        if self.phase != ScenePhase::Unmounted {
            warn!(phase = ?self.phase, "Viewer scene already mounted");
            return;
        }
        self.phase = ScenePhase::Mounting;

        let path = self.config.model.path.clone();
        info!(path = %path, "Mounting viewer scene");

        let (tx, rx) = oneshot::channel();
        let loader = self.loader.clone();
        let task = tokio::spawn(async move {
            let outcome = loader.load(&path).await;
            // Receiver is gone once the scene unmounts
            let _ = tx.send(outcome);
        });

        self.pending = Some(PendingLoad { result: rx, task });
        self.phase = ScenePhase::Pending;
    }

    /// Tear down the mount, cancelling any in-flight load
    pub fn unmount(&mut self) {
        if self.phase == ScenePhase::Unmounted {
            return;
        }
        if self.pending.take().is_some() {
            debug!(path = %self.config.model.path, "Cancelled in-flight model load");
        }
        self.model = None;
        self.failure = None;
        self.phase = ScenePhase::Unmounted;
        info!("Viewer scene unmounted");
    }

    /// Compose the next frame.
    ///
    /// Returns the load failure on the frame it is observed; later frames
    /// present the scene without the model.
    pub fn frame(&mut self) -> Result<FrameGraph, AssetLoadError> {
        if self.phase == ScenePhase::Unmounted {
            return Ok(FrameGraph::default());
        }

        self.poll_load()?;

        if let (Some(spin), Some(model)) = (self.auto_rotate, self.model.as_mut()) {
            spin.step(&mut model.transform);
        }

        Ok(compose(&self.config, self.model.as_ref()))
    }

    /// Wait for the current load to resolve without presenting frames
    pub async fn wait_until_settled(&mut self) -> Result<(), AssetLoadError> {
        let Some(pending) = self.pending.as_mut() else {
            return match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            };
        };
        let outcome = match (&mut pending.result).await {
            Ok(outcome) => outcome,
            Err(_) => Err(self.abandoned()),
        };
        self.settle(outcome)
    }

    /// Edit the model transform directly. Refused while auto-rotation owns
    /// the transform, or before the model is presented.
    pub fn edit_model(&mut self, edit: impl FnOnce(&mut ModelTransform)) -> bool {
        if self.auto_rotate.is_some() {
            warn!("Model transform is driven by auto-rotation, edit ignored");
            return false;
        }
        match self.model.as_mut() {
            Some(model) => {
                edit(&mut model.transform);
                true
            }
            None => false,
        }
    }

    fn poll_load(&mut self) -> Result<(), AssetLoadError> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };
        let outcome = match pending.result.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => Err(self.abandoned()),
        };
        self.settle(outcome)
    }

    fn settle(&mut self, outcome: LoadOutcome) -> Result<(), AssetLoadError> {
        self.pending = None;
        match outcome {
            Ok(asset) => {
                info!(
                    path = %asset.source(),
                    primitives = asset.primitive_count(),
                    "Model ready"
                );
                self.model = Some(ModelNode {
                    asset,
                    transform: ModelTransform::from_placement(&self.config.model),
                });
                self.phase = ScenePhase::Interactive;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Model failed to load");
                self.failure = Some(e.clone());
                self.phase = ScenePhase::Failed;
                Err(e)
            }
        }
    }

    fn abandoned(&self) -> AssetLoadError {
        AssetLoadError::Unreadable {
            path: self.config.model.path.clone(),
            message: "load task ended without a result".to_string(),
        }
    }
}

/// What the host presents
pub enum HostView<'a> {
    Scene(&'a mut ViewerScene),
    Fallback(&'a str),
}

/// Mounts the viewer scene or a text fallback depending on [`HeroMode`]
pub struct HostShell {
    mode: HeroMode,
    fallback_message: String,
    scene: ViewerScene,
}

impl HostShell {
    /// Build the shell and mount the scene if the hero is enabled. Must be
    /// called from within a tokio runtime.
    pub fn new(config: ShowcaseConfig, loader: AssetLoader) -> Self {
        let mode = config.host.hero;
        let fallback_message = config.host.fallback_message.clone();
        let mut shell = Self {
            mode,
            fallback_message,
            scene: ViewerScene::new(config, loader),
        };
        shell.apply_mode();
        shell
    }

    pub fn mode(&self) -> HeroMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: HeroMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.apply_mode();
    }

    pub fn scene(&self) -> &ViewerScene {
        &self.scene
    }

    pub fn view(&mut self) -> HostView<'_> {
        match self.mode {
            HeroMode::Enabled => HostView::Scene(&mut self.scene),
            HeroMode::Disabled => HostView::Fallback(&self.fallback_message),
        }
    }

    fn apply_mode(&mut self) {
        match self.mode {
            HeroMode::Enabled => self.scene.mount(),
            HeroMode::Disabled => self.scene.unmount(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::{GatedSource, MemorySource, TRIANGLE_GLTF};
    use crate::scene::LightKind;
    use crate::EnvironmentPreset;
    use std::time::Duration;

    const TEST_PATH: &str = "/models/test.glb";
    const MISSING_PATH: &str = "/models/missing.glb";

    fn config_for(path: &str) -> ShowcaseConfig {
        let mut config = ShowcaseConfig::default();
        config.model.path = path.to_string();
        config
    }

    fn loader() -> AssetLoader {
        AssetLoader::new(MemorySource::new(&[(TEST_PATH, TRIANGLE_GLTF)]))
    }

    async fn frame_until_settled(scene: &mut ViewerScene) -> Result<FrameGraph, AssetLoadError> {
        for _ in 0..1000 {
            let frame = scene.frame()?;
            if scene.phase() != ScenePhase::Pending {
                return Ok(frame);
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("model load did not settle");
    }

    #[tokio::test]
    async fn test_ready_scene_contents() {
        let mut scene = ViewerScene::new(config_for(TEST_PATH), loader());
        scene.mount();

        let frame = frame_until_settled(&mut scene).await.unwrap();

        assert_eq!(scene.phase(), ScenePhase::Interactive);
        assert_eq!(scene.load_state(), Some(LoadState::Ready));
        assert_eq!(frame.count_lights(LightKind::Ambient), 1);
        assert_eq!(frame.count_lights(LightKind::Spot), 1);
        assert_eq!(frame.count_lights(LightKind::Point), 1);
        assert_eq!(
            frame.environments().collect::<Vec<_>>(),
            vec![EnvironmentPreset::City]
        );

        let models: Vec<_> = frame.models().collect();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].transform.scale, 0.1);
        assert_eq!(models[0].transform.translation, [0.0, -1.5, 0.0]);
        assert!(models[0].asset.primitive_count() >= 1);
    }

    #[tokio::test]
    async fn test_missing_asset_reaches_error_boundary() {
        let mut scene = ViewerScene::new(config_for(MISSING_PATH), loader());
        scene.mount();

        let err = frame_until_settled(&mut scene).await.unwrap_err();

        assert_eq!(err, AssetLoadError::NotFound(MISSING_PATH.to_string()));
        assert_eq!(scene.phase(), ScenePhase::Failed);
        assert_eq!(scene.failure(), Some(&err));

        // Later frames keep the subtree empty and never become ready
        for _ in 0..5 {
            let frame = scene.frame().unwrap();
            assert_eq!(frame.models().count(), 0);
        }
        assert_eq!(scene.load_state(), Some(LoadState::Failed));
    }

    #[tokio::test]
    async fn test_nothing_presented_before_load_resolves() {
        let (source, release) = GatedSource::new(&[(TEST_PATH, TRIANGLE_GLTF)]);
        let mut scene = ViewerScene::new(config_for(TEST_PATH), AssetLoader::new(source));
        scene.mount();

        for _ in 0..3 {
            let frame = scene.frame().unwrap();
            assert_eq!(frame.models().count(), 0);
            assert!(frame.placeholder().is_none());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(scene.phase(), ScenePhase::Pending);

        release.send(()).unwrap();
        let frame = frame_until_settled(&mut scene).await.unwrap();
        assert_eq!(frame.models().count(), 1);
    }

    #[tokio::test]
    async fn test_host_toggle_cancels_pending_load() {
        let (source, release) = GatedSource::new(&[(TEST_PATH, TRIANGLE_GLTF)]);
        let loader = AssetLoader::new(source);
        let mut shell = HostShell::new(config_for(TEST_PATH), loader.clone());
        assert_eq!(shell.scene().phase(), ScenePhase::Pending);

        // Wait until the fetch is actually in flight
        while loader.state(TEST_PATH).is_none() {
            tokio::task::yield_now().await;
        }

        shell.set_mode(HeroMode::Disabled);
        assert_eq!(shell.scene().phase(), ScenePhase::Unmounted);
        match shell.view() {
            HostView::Fallback(message) => assert!(message.contains("3D Hero Disabled")),
            HostView::Scene(_) => panic!("expected fallback"),
        }

        // Let the fetch finish after unmount
        release.send(()).unwrap();
        while loader.state(TEST_PATH) == Some(LoadState::Pending) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        // The cache still completes; the unmounted scene never sees it
        assert_eq!(loader.state(TEST_PATH), Some(LoadState::Ready));
        assert_eq!(shell.scene().phase(), ScenePhase::Unmounted);
        assert!(shell.scene().model().is_none());
        assert!(shell.scene().failure().is_none());
    }

    #[tokio::test]
    async fn test_remount_retries_after_failure() {
        let loader = loader();
        let mut scene = ViewerScene::new(config_for(MISSING_PATH), loader.clone());

        scene.mount();
        assert!(scene.wait_until_settled().await.is_err());
        scene.unmount();
        scene.mount();
        assert!(scene.wait_until_settled().await.is_err());

        assert_eq!(loader.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_single_load_per_mount() {
        let loader = loader();
        let mut scene = ViewerScene::new(config_for(TEST_PATH), loader.clone());

        scene.mount();
        scene.mount();
        scene.wait_until_settled().await.unwrap();

        assert_eq!(loader.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_auto_rotation_advances_yaw() {
        let mut config = config_for(TEST_PATH);
        config.animation.auto_rotate = true;
        let mut scene = ViewerScene::new(config, loader());
        scene.mount();
        scene.wait_until_settled().await.unwrap();

        let start = scene.model().unwrap().transform.yaw;
        let mut previous = start;
        for _ in 0..100 {
            let frame = scene.frame().unwrap();
            let yaw = frame.models().next().unwrap().transform.yaw;
            assert!(yaw > previous);
            previous = yaw;
        }

        let expected = 100.0 * 0.005;
        assert!((previous - start - expected).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_yaw_static_without_auto_rotation() {
        let mut scene = ViewerScene::new(config_for(TEST_PATH), loader());
        scene.mount();
        scene.wait_until_settled().await.unwrap();

        for _ in 0..100 {
            scene.frame().unwrap();
        }

        assert_eq!(scene.model().unwrap().transform.yaw, 0.0);
    }

    #[tokio::test]
    async fn test_auto_rotation_is_sole_writer() {
        let mut config = config_for(TEST_PATH);
        config.animation.auto_rotate = true;
        let mut scene = ViewerScene::new(config, loader());
        scene.mount();
        scene.wait_until_settled().await.unwrap();

        assert!(!scene.edit_model(|t| t.yaw = 1.0));
        assert_eq!(scene.model().unwrap().transform.yaw, 0.0);
    }

    #[tokio::test]
    async fn test_edit_model_without_auto_rotation() {
        let mut scene = ViewerScene::new(config_for(TEST_PATH), loader());
        assert!(!scene.edit_model(|t| t.scale = 1.0));

        scene.mount();
        scene.wait_until_settled().await.unwrap();

        assert!(scene.edit_model(|t| t.scale = 1.0));
        assert_eq!(scene.model().unwrap().transform.scale, 1.0);
    }

    #[tokio::test]
    async fn test_unmounted_frame_is_empty() {
        let mut scene = ViewerScene::new(config_for(TEST_PATH), loader());
        assert!(scene.frame().unwrap().is_empty());
        assert_eq!(scene.load_state(), None);
    }
}
