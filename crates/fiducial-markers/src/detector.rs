//! The per-frame detection pipeline.

use nalgebra::Point2;

use fiducial_code::{recover_code, translate_code, CellGrid};
use fiducial_core::{CameraParams, DebugSink, GrayImage, GrayImageView, Pixel};
use fiducial_pose::{bearing_to_point, estimate_pose, rotation_from_vertices};
use fiducial_segment::{find_quad, label_adaptive, refine_vertices, threshold_adaptive, trace_contour};

use crate::marker::{compose_rotation, image_centre, orient_top_left, Marker, MarkerPoint};
use crate::params::DetectorParams;
use crate::unwarp::unwarp_marker;

/// Finds and reconstructs every decodable marker in a frame.
///
/// The detector owns the camera intrinsics, the pipeline parameters and an
/// optional [`DebugSink`] receiving stage snapshots. One instance processes
/// one frame at a time; independent instances may run on separate threads.
pub struct MarkerDetector {
    camera: CameraParams,
    params: DetectorParams,
    sink: Option<Box<dyn DebugSink>>,
}

impl MarkerDetector {
    pub fn new(camera: CameraParams) -> Self {
        camera.assert_valid();
        Self {
            camera,
            params: DetectorParams::default(),
            sink: None,
        }
    }

    pub fn with_params(mut self, params: DetectorParams) -> Self {
        params.assert_valid();
        self.params = params;
        self
    }

    /// Attach a debug sink; its `init` hook runs immediately.
    pub fn with_sink(mut self, mut sink: Box<dyn DebugSink>) -> Self {
        sink.init();
        self.sink = Some(sink);
        self
    }

    #[inline]
    pub fn camera(&self) -> &CameraParams {
        &self.camera
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detect markers of one fixed physical side length (metres).
    pub fn detect(&mut self, frame: &GrayImageView<'_>, side: f32) -> Vec<Marker> {
        assert!(side.is_finite() && side > 0.0, "marker side must be positive");
        self.run(frame, &|_| side)
    }

    /// Detect markers whose side length depends on the decoded code.
    pub fn detect_with_sizes(
        &mut self,
        frame: &GrayImageView<'_>,
        side_for_code: impl Fn(u8) -> f32,
    ) -> Vec<Marker> {
        self.run(frame, &side_for_code)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(w = frame.width, h = frame.height))
    )]
    fn run(&mut self, frame: &GrayImageView<'_>, side_for_code: &dyn Fn(u8) -> f32) -> Vec<Marker> {
        assert_eq!(
            frame.data.len(),
            frame.width * frame.height,
            "frame must be a single-channel w*h buffer"
        );

        if let Some(sink) = self.sink.as_deref_mut() {
            sink.log(Some("find_markers() input image"), Some(frame));
        }

        let labelled = label_adaptive(
            frame,
            self.params.threshold_window,
            self.params.threshold_margin,
            self.sink.as_deref_mut(),
        );

        let logging = self.sink.is_some();
        let mut kept_contours = logging.then(|| GrayImage::new(frame.width, frame.height));
        let mut discarded_contours = logging.then(|| GrayImage::new(frame.width, frame.height));

        let mut markers = Vec::new();

        for region in 0..labelled.region_count() {
            if !labelled.is_usable(region) {
                continue;
            }

            let contour = trace_contour(&labelled, region);

            let mut quad = match find_quad(&contour) {
                Ok(quad) => quad,
                Err(reason) => {
                    log::debug!("region {region}: {reason}");
                    if let Some(img) = discarded_contours.as_mut() {
                        draw_contour(img, &contour);
                    }
                    continue;
                }
            };
            if let Some(img) = kept_contours.as_mut() {
                draw_contour(img, &contour);
            }

            refine_vertices(&mut quad, &contour);

            let vertices = orient_top_left(quad.vertices);
            let centre = image_centre(&vertices);

            if let Some(marker) = self.recover_marker(frame, vertices, centre, side_for_code) {
                markers.push(marker);
            }
        }

        if let Some(sink) = self.sink.as_deref_mut() {
            if let Some(img) = kept_contours.as_ref() {
                sink.log(Some("contours"), Some(&img.as_view()));
            }
            if let Some(img) = discarded_contours.as_ref() {
                sink.log(Some("discarded contours"), Some(&img.as_view()));
            }
        }

        markers
    }

    /// Decode the code grid behind a refined quad and, on success, build
    /// the fully reconstructed marker.
    fn recover_marker(
        &mut self,
        frame: &GrayImageView<'_>,
        vertices: [Point2<f32>; 4],
        centre: Point2<f32>,
        side_for_code: &dyn Fn(u8) -> f32,
    ) -> Option<Marker> {
        let unwarped = unwarp_marker(
            frame,
            &vertices,
            self.params.unwarp_width,
            self.sink.as_deref_mut(),
        )?;

        if let Some(sink) = self.sink.as_deref_mut() {
            sink.log(Some("unwarped marker"), Some(&unwarped.as_view()));
        }

        // the unwarped image is re-thresholded to clean black/white before
        // the cells are averaged
        let rethresholded = threshold_adaptive(
            &unwarped.as_view(),
            self.params.rethreshold_window,
            self.params.rethreshold_margin,
        );
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.log(
                Some("unwarped and thresholded marker"),
                Some(&rethresholded.as_view()),
            );
        }

        let grid = CellGrid::from_image(&rethresholded.as_view(), self.params.cell_threshold);
        log::trace!("cell grid:\n{grid}");

        let Some(recovered) = recover_code(&grid) else {
            if let Some(sink) = self.sink.as_deref_mut() {
                sink.log(
                    Some("failed to recover code from unwarped marker -- discarding"),
                    None,
                );
            }
            return None;
        };

        let Some(code) = translate_code(recovered.number) else {
            if let Some(sink) = self.sink.as_deref_mut() {
                sink.log(
                    Some("decoded a reserved code number -- discarding"),
                    None,
                );
            }
            return None;
        };

        let side = side_for_code(code);
        assert!(side.is_finite() && side > 0.0, "marker side must be positive");

        // image coordinates relative to the principal point, y up
        let pp = self.camera.principal_point;
        let relative = [
            Point2::new(vertices[0].x - pp.x, pp.y - vertices[0].y),
            Point2::new(vertices[1].x - pp.x, pp.y - vertices[1].y),
            Point2::new(vertices[2].x - pp.x, pp.y - vertices[2].y),
            Point2::new(vertices[3].x - pp.x, pp.y - vertices[3].y),
        ];

        let pose = estimate_pose(&relative, side, self.camera.mean_focal())?;

        let centred = pose.vertices.map(|v| v - pose.centre.coords);
        let rotation = compose_rotation(
            rotation_from_vertices(&centred),
            recovered.rotation_offset,
        );
        let bearing = bearing_to_point(pose.centre);

        let points = std::array::from_fn(|i| MarkerPoint {
            image: vertices[i],
            world: pose.vertices[i],
        });

        Some(Marker {
            code,
            rotation_offset: recovered.rotation_offset,
            centre: MarkerPoint {
                image: centre,
                world: pose.centre,
            },
            vertices: points,
            rotation,
            bearing,
            distance: pose.distance,
        })
    }
}

fn draw_contour(img: &mut GrayImage, contour: &[Pixel]) {
    for p in contour {
        img.set(p.x as usize, p.y as usize, 0xff);
    }
}
