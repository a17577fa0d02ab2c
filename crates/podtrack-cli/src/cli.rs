//! Command handlers for the `pod` binary.
//!
//! Each handler opens a tracker for the requested pair, runs one operation
//! and renders the result. Tracker events are drained after every operation:
//! a refetch request reloads the record so the output reflects the
//! authority's state, and success notices are shown to the user. Failures are
//! returned as errors carrying the user-facing notice.

use std::path::Path;

use anyhow::{anyhow, Result};
use log::debug;
use podtrack_core::{
    CatalogView, LocalAuthority, PodError, PodTracker, TrackerBuilder, TrackerEvent, UploadFile,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    args::{AttachArgs, Commands, PodArgs, RegisterArgs, UploadArgs},
    renderer::TerminalRenderer,
};

/// Turns a core error into the message shown to the user.
fn user_error(error: PodError) -> anyhow::Error {
    debug!("{error:?}");
    anyhow!(error.notice())
}

/// [`user_error`] for a failed advance or revert.
fn transition_error(error: PodError) -> anyhow::Error {
    debug!("{error:?}");
    anyhow!(error.transition_notice())
}

pub struct Cli {
    builder: TrackerBuilder,
    events: UnboundedReceiver<TrackerEvent>,
    local: Option<LocalAuthority>,
    renderer: TerminalRenderer,
}

impl Cli {
    /// `local` is set when the builder runs over the SQLite store; it enables
    /// `register`.
    pub fn new(
        builder: TrackerBuilder,
        events: UnboundedReceiver<TrackerEvent>,
        local: Option<LocalAuthority>,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            builder,
            events,
            local,
            renderer,
        }
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Steps => self.steps(),
            Commands::Register(args) => self.register(args).await,
            Commands::Show(args) => self.show(args).await,
            Commands::Advance(args) => self.advance(args).await,
            Commands::Revert(args) => self.revert(args).await,
            Commands::Upload(args) => self.upload(args).await,
            Commands::Attach(args) => self.attach(args).await,
            Commands::Docs(args) => self.docs(args).await,
        }
    }

    fn steps(&self) -> Result<()> {
        self.renderer
            .render(&CatalogView(self.builder.catalog()).to_string())
    }

    async fn register(&mut self, args: RegisterArgs) -> Result<()> {
        let Some(local) = &self.local else {
            return Err(anyhow!(
                "Records can only be registered against a local database; remove --api-url"
            ));
        };

        let RegisterArgs { pod, status } = args;
        local
            .register(&pod.trip_id, &pod.client_id, status.as_deref())
            .await
            .map_err(user_error)?;

        let tracker = self.open(&pod).await?;
        self.renderer.render(&tracker.progression().to_string())
    }

    async fn show(&mut self, args: PodArgs) -> Result<()> {
        let tracker = self.open(&args).await?;
        self.renderer.render(&tracker.progression().to_string())?;
        self.renderer.render("\n")?;
        self.renderer.render(&tracker.documents_view().to_string())
    }

    async fn docs(&mut self, args: PodArgs) -> Result<()> {
        let tracker = self.open(&args).await?;
        self.renderer.render(&tracker.documents_view().to_string())
    }

    async fn advance(&mut self, args: PodArgs) -> Result<()> {
        let mut tracker = self.open(&args).await?;
        tracker.advance().await.map_err(transition_error)?;
        self.settle(&mut tracker).await?;
        self.renderer.render(&tracker.progression().to_string())
    }

    async fn revert(&mut self, args: PodArgs) -> Result<()> {
        let mut tracker = self.open(&args).await?;
        tracker.revert().await.map_err(transition_error)?;
        self.settle(&mut tracker).await?;
        self.renderer.render(&tracker.progression().to_string())
    }

    async fn upload(&mut self, args: UploadArgs) -> Result<()> {
        let UploadArgs { pod, step, file } = args;
        let mut tracker = self.open(&pod).await?;
        let upload = self.read_file(&file).await?;

        tracker
            .upload_evidence(&step, &upload)
            .await
            .map_err(user_error)?;
        self.settle(&mut tracker).await?;
        self.renderer.render(&tracker.documents_view().to_string())
    }

    async fn attach(&mut self, args: AttachArgs) -> Result<()> {
        let AttachArgs { pod, file } = args;
        let tracker = self
            .builder
            .attach(&pod.trip_id, &pod.client_id, None)
            .map_err(user_error)?;
        let upload = self.read_file(&file).await?;

        let url = tracker.upload_single(&upload).await.map_err(user_error)?;
        self.settle_notices()?;
        self.renderer.render(&format!("{url}\n"))
    }

    /// Reads an upload from disk under the configured upload policy.
    async fn read_file(&self, path: &Path) -> Result<UploadFile> {
        self.builder
            .config()
            .upload_policy
            .load(path)
            .await
            .map_err(user_error)
    }

    async fn open(&self, pod: &PodArgs) -> Result<PodTracker> {
        self.builder
            .open(&pod.trip_id, &pod.client_id)
            .await
            .map_err(user_error)
    }

    /// Handles the events emitted by the last operation.
    ///
    /// Success notices are printed before the reload. A failed reload is
    /// reported as a failure after a saved change.
    async fn settle(&mut self, tracker: &mut PodTracker) -> Result<()> {
        let mut refetch = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                TrackerEvent::Refetch(key) if &key == tracker.key() => refetch = true,
                TrackerEvent::Refetch(key) => debug!("Ignoring refetch for {key}"),
                TrackerEvent::Notice(status) if status.success => {
                    self.renderer.notice(&status)?;
                }
                // Failures are returned to main and printed there
                TrackerEvent::Notice(_) => {}
            }
        }

        if refetch {
            tracker.refresh().await.map_err(|e| {
                debug!("{e:?}");
                anyhow!(
                    "The change was saved, but reloading the POD record failed: {}",
                    e.notice()
                )
            })?;
        }
        Ok(())
    }

    fn settle_notices(&mut self) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            if let TrackerEvent::Notice(status) = event {
                if status.success {
                    self.renderer.notice(&status)?;
                }
            }
        }
        Ok(())
    }
}

