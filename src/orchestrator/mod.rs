//! Provisioning Orchestration: 7-stage USB pipeline (Input -> Format -> Capacity -> Mount -> Transfer -> Split -> Teardown).

pub mod phases;
pub mod state;

use std::sync::Arc;

pub use state::{PipelineStage, PipelineState};

use crate::config::{validator, MediaConfig};
use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionReport, ProvisionRequest, SourceImage, TargetDevice};
use crate::system::ToolRunner;
use crate::ui::{ConfirmationGate, OperatorPrompt};

/// How a run ended when no stage failed.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// All stages ran; teardown warnings, if any, are in the report
    Completed(ProvisionReport),
    /// The operator declined the erase prompt; nothing was touched
    Aborted,
}

impl PipelineOutcome {
    /// Process exit status for this outcome. An explicit abort is not an error.
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Exit status for a finished run: 0 on completion or abort, 1 on any stage failure.
pub fn exit_code_for(result: &Result<PipelineOutcome>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => 1,
    }
}

/// Drives one provisioning run over a `ToolRunner`.
///
/// Stages are awaited strictly in order; no two tools ever run at once.
pub struct ProvisioningPipeline {
    config: MediaConfig,
    runner: Arc<dyn ToolRunner>,
    state: PipelineState,
}

impl ProvisioningPipeline {
    /// Create a pipeline in the Init stage.
    ///
    /// # Errors
    /// * `Config` if `config` fails validation
    pub fn new(config: MediaConfig, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        validator::validate_media_config(&config)?;
        Ok(ProvisioningPipeline {
            config,
            runner,
            state: PipelineState::new(),
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn current_stage(&self) -> PipelineStage {
        self.state.stage
    }

    /// Ask the operator for the image and device, listing disks in between,
    /// then run the pipeline.
    pub async fn run_interactive<P>(&mut self, prompt: &mut P) -> Result<PipelineOutcome>
    where
        P: OperatorPrompt + ?Sized,
    {
        let image_path = prompt.ask_image_path();

        // Resolve the image before showing disks so a typo fails fast
        let image = self.guard(phases::resolve_source_image(&image_path, &self.config.image_extension))?;
        phases::list_disks(self.runner.as_ref()).await;

        let device_identifier = prompt.ask_device();
        self.run_resolved(image, &device_identifier, prompt).await
    }

    /// Resolve `request` and run every stage.
    ///
    /// Returns `Aborted` if `gate` declines the erase, without touching the
    /// device. Any stage 1-6 failure moves the state to Aborted and is
    /// returned; teardown problems only end up in the report.
    pub async fn run<G>(&mut self, request: ProvisionRequest, gate: &mut G) -> Result<PipelineOutcome>
    where
        G: ConfirmationGate + ?Sized,
    {
        let image = self.guard(phases::resolve_source_image(
            &request.image_path,
            &self.config.image_extension,
        ))?;
        self.run_resolved(image, &request.device_identifier, gate).await
    }

    /// Resolve the device for an already resolved image, confirm, then execute.
    async fn run_resolved<G>(
        &mut self,
        image: SourceImage,
        device_identifier: &str,
        gate: &mut G,
    ) -> Result<PipelineOutcome>
    where
        G: ConfirmationGate + ?Sized,
    {
        let device = self.guard(phases::resolve_target_device(
            device_identifier,
            &self.config.raw_disk_prefix,
        ))?;
        self.advance(PipelineStage::Resolved)?;

        if !gate.confirm_erase(&device) {
            crate::log_parsed!("Aborted.");
            self.advance(PipelineStage::Cancelled)?;
            return Ok(PipelineOutcome::Aborted);
        }

        let report = self.execute(image, device).await?;
        Ok(PipelineOutcome::Completed(report))
    }

    /// Stages 2-7 for an already confirmed device.
    async fn execute(&mut self, image: SourceImage, device: TargetDevice) -> Result<ProvisionReport> {
        let runner = Arc::clone(&self.runner);
        let runner = runner.as_ref();

        let target_volume = self.guard(phases::format_target(runner, &device, &self.config).await)?;
        self.advance(PipelineStage::Formatted)?;

        let available = self.guard(phases::available_bytes(runner, &target_volume).await)?;
        self.advance(PipelineStage::Verified)?;

        let source_mount = self.guard(
            phases::mount_image(runner, &image, &self.config.volume_prefix()).await,
        )?;
        self.advance(PipelineStage::Mounted)?;

        if self.config.enforce_capacity {
            let required = phases::source_tree_size(source_mount.path()).map_err(|e| {
                ProvisionError::NotFound(format!("cannot measure {}: {}", source_mount, e))
            });
            let required = self.guard(required)?;
            self.guard(phases::check_capacity(required, available))?;
        }

        self.guard(
            phases::copy_excluding(runner, &source_mount, &target_volume, &self.config.excluded_object)
                .await,
        )?;
        self.advance(PipelineStage::Transferred)?;

        log::debug!(
            "[Pipeline] Chunks will be written as {}",
            self.config.chunk_relative_path().display()
        );
        let chunks = self.guard(
            phases::split_oversized_object(
                runner,
                &source_mount,
                &target_volume,
                &self.config.excluded_object,
                self.config.chunk_size_mb,
                &self.config.chunk_extension,
            )
            .await,
        )?;
        self.advance(PipelineStage::Split)?;

        let teardown_warnings = phases::teardown(runner, &source_mount, &target_volume).await;
        self.advance(PipelineStage::TornDown)?;

        if let Ok(elapsed) = self.state.elapsed_since_start() {
            log::info!("[Pipeline] Completed in {:.1}s", elapsed.as_secs_f64());
        }

        Ok(ProvisionReport {
            image,
            device,
            target_volume,
            source_mount,
            available,
            chunks,
            teardown_warnings,
        })
    }

    /// Record a stage failure in the state before handing it back.
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            log::error!("[Pipeline] Failed after stage '{}': {}", self.state.stage.as_str(), e);
            self.state.record_error(e.to_string());
            e
        })
    }

    fn advance(&mut self, next: PipelineStage) -> Result<()> {
        self.state.transition_to(next).map_err(|msg| {
            log::error!("[Pipeline] {}", msg);
            ProvisionError::InvalidInput(msg)
        })?;
        log::debug!("[Pipeline] Stage -> {}", next.as_str());
        Ok(())
    }
}
