use reforma_contracts::events::{AnalysisEvent, AnalysisEventLog};
use reforma_contracts::report::AnalysisReport;
use reforma_contracts::rooms::{RoomCategory, RoomVerdict};
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, RoomFindings};
use crate::bucketer::RoomBuckets;
use crate::classifier::{OpenAiVisionClassifier, VisionClassifier};
use crate::config::PipelineConfig;
use crate::error::AnalysisError;
use crate::fallback::fallback_report;
use crate::imaging::{HttpImageSource, ImageSource};
use crate::listing::{property_id_from_input, ListingClient, ListingSource, ListingSummary};
use crate::throttle::{FixedDelayGate, Throttle};

/// Listing plus the report built from it.
#[derive(Debug, Clone)]
pub struct PropertyAnalysis {
    pub listing: ListingSummary,
    pub report: AnalysisReport,
}

/// Sequential room-analysis pipeline. One room is fetched, classified and recorded
/// before the next one starts.
pub struct RenovationPipeline {
    listings: Box<dyn ListingSource>,
    images: Box<dyn ImageSource>,
    classifier: Option<Box<dyn VisionClassifier>>,
    classifier_unavailable: Option<String>,
    throttle: Box<dyn Throttle>,
    events: Option<AnalysisEventLog>,
}

impl RenovationPipeline {
    pub fn new(
        listings: Box<dyn ListingSource>,
        images: Box<dyn ImageSource>,
        classifier: Option<Box<dyn VisionClassifier>>,
        throttle: Box<dyn Throttle>,
    ) -> Self {
        let classifier_unavailable = classifier
            .is_none()
            .then(|| "no vision classifier configured".to_string());
        Self {
            listings,
            images,
            classifier,
            classifier_unavailable,
            throttle,
            events: None,
        }
    }

    /// Wires the HTTP-backed collaborators. A vision client that cannot be built leaves
    /// the pipeline on the area-only path rather than failing.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, AnalysisError> {
        let listings = ListingClient::from_config(config)
            .map_err(|err| AnalysisError::Config(format!("listing client: {err}")))?;
        let images = HttpImageSource::new(
            config.http_timeout,
            config.image_width,
            config.image_height,
            config.jpeg_quality,
        )
        .map_err(|err| AnalysisError::Config(format!("image client: {err}")))?;

        let (classifier, unavailable): (Option<Box<dyn VisionClassifier>>, Option<String>) =
            match OpenAiVisionClassifier::from_config(config) {
                Some(Ok(classifier)) => (Some(Box::new(classifier)), None),
                Some(Err(err)) => (None, Some(format!("vision client could not be built: {err}"))),
                None => (None, Some("OPENAI_API_KEY is not configured".to_string())),
            };

        let mut pipeline = Self::new(
            Box::new(listings),
            Box::new(images),
            classifier,
            Box::new(FixedDelayGate::new(config.throttle_delay)),
        );
        if unavailable.is_some() {
            pipeline.classifier_unavailable = unavailable;
        }
        Ok(pipeline)
    }

    pub fn with_event_log(mut self, events: AnalysisEventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_throttle(mut self, throttle: Box<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Resolves `input` to a property id, fetches the listing and analyzes it. Only an
    /// unusable id or a failed listing lookup is an error.
    pub fn analyze_property(&mut self, input: &str) -> Result<PropertyAnalysis, AnalysisError> {
        let property_id = property_id_from_input(input)?;
        let listing = self.listings.fetch_listing(&property_id)?;
        let report = self.analyze_listing(&listing);
        Ok(PropertyAnalysis { listing, report })
    }

    /// Always produces a report: image analysis when a classifier is available, the
    /// area-only estimate otherwise.
    pub fn analyze_listing(&mut self, listing: &ListingSummary) -> AnalysisReport {
        self.record(AnalysisEvent::AnalysisStarted {
            property_id: listing.property_id.clone(),
            area_m2: listing.area_m2,
            image_count: listing.images.len(),
        });

        let (report, classified_rooms) = if self.classifier.is_some() {
            let buckets = RoomBuckets::from_images(listing.images.iter().cloned());
            let findings = self.classify_rooms(&buckets);
            (
                aggregate(&findings, listing.area_m2),
                findings.classified_total(),
            )
        } else {
            let reason = self
                .classifier_unavailable
                .clone()
                .unwrap_or_else(|| "no vision classifier configured".to_string());
            warn!(reason = %reason, "using area-based estimate");
            self.record(AnalysisEvent::FallbackUsed { reason });
            (fallback_report(listing.area_m2), 0)
        };

        info!(
            total = %report.total(),
            confidence = report.confidence().as_str(),
            "report ready"
        );
        self.record(AnalysisEvent::ReportReady {
            total: report.total().to_string(),
            confidence: report.confidence().as_str().to_string(),
            classified_rooms,
        });
        report
    }

    fn classify_rooms(&mut self, buckets: &RoomBuckets) -> RoomFindings {
        let mut findings = RoomFindings::new();
        if let Some(classifier) = self.classifier.as_deref() {
            info!(
                classifier = classifier.name(),
                images = buckets.total_images(),
                "classifying rooms"
            );
        }
        for (room, urls) in buckets.iter() {
            let label = room.source_label();
            let Some(sample) = buckets.sample(room) else {
                if room.is_surfaced() {
                    findings.record_placeholder(
                        room,
                        RoomVerdict::unknown(format!("No hay imágenes disponibles de {label}.")),
                    );
                }
                continue;
            };
            info!(room = label, images = urls.len(), "analyzing room");

            let image = match self.images.fetch_encoded(sample.url()) {
                Ok(image) => image,
                Err(err) => {
                    self.room_failed(
                        &mut findings,
                        room,
                        format!("No se pudo procesar la imagen de {label}: {err}"),
                    );
                    continue;
                }
            };

            debug!(
                room = label,
                bytes = image.byte_len(),
                dimensions = ?image.dimensions(),
                "image ready"
            );

            let Some(classifier) = self.classifier.as_deref() else {
                break;
            };
            self.throttle.wait_turn();
            match classifier.classify(&image, room) {
                Ok(verdict) => {
                    info!(
                        room = label,
                        needs_renovation = verdict.needs_renovation.as_str(),
                        cost = %verdict.estimated_cost,
                        "room classified"
                    );
                    self.record(AnalysisEvent::RoomClassified {
                        room,
                        image_url: sample.url().to_string(),
                        verdict: verdict.clone(),
                    });
                    findings.record_classified(room, verdict);
                }
                Err(err) => {
                    self.room_failed(
                        &mut findings,
                        room,
                        format!("No se pudo analizar la imagen: {err}"),
                    );
                }
            }
        }
        findings
    }

    fn room_failed(&self, findings: &mut RoomFindings, room: RoomCategory, justification: String) {
        warn!(room = room.source_label(), reason = %justification, "room left unanalyzed");
        self.record(AnalysisEvent::RoomFailed {
            room,
            reason: justification.clone(),
        });
        findings.record_placeholder(room, RoomVerdict::unknown(justification));
    }

    fn record(&self, event: AnalysisEvent) {
        let Some(events) = &self.events else {
            return;
        };
        if let Err(err) = events.emit(&event) {
            warn!(path = %events.path().display(), error = %err, "event log write failed");
        }
    }
}
