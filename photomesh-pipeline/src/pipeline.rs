//! The 3D photo generation pass
//!
//! A pass owns every buffer it creates. The dense grid, the extended
//! background and each simplified mesh are separate values, so no stage
//! sees another stage's edits.

use photomesh_algorithms::{
    all_triangles, feather_mask, filter_foreground_border_vertices, filter_image,
    filter_vertices, project_vertices, remove_background_outliers, split_topology,
    synthesize_extended_background, ExtendedBackground, FilterKind, OutlierStats,
    SynthesisOptions, SynthesisStats, BORDER_FILTER_RADIUS, FEATHER_RADIUS,
};
use photomesh_core::{
    CameraFov, Face, ImageSource, MeshMaterial, MeshSink, MeshTexture, Result, Settings,
    TextureSink, TexturedMesh, VertexGrid,
};
use photomesh_simplification::{
    IncrementalSimplifier, QuadtreeSimplifier, SimplificationStats, VertexSelection,
};

/// Name of the parent object every generated mesh is attached to
pub const ROOT_NAME: &str = "3D Photo";
pub const FOREGROUND_NAME: &str = "Foreground";
pub const BACKGROUND_NAME: &str = "Background";
/// Name of the single mesh emitted when foreground and background are not separated
pub const UNSEPARATED_NAME: &str = "Mesh";

/// Radius of the median filter run on background distances during outlier removal
pub const BACKGROUND_MEDIAN_RADIUS: usize = 4;
/// Radius of the median filter run (twice) on foreground distances during outlier removal
pub const FOREGROUND_MEDIAN_RADIUS: usize = 8;
/// Radius of the mean filter used for mesh smoothing
pub const SMOOTHING_RADIUS: usize = 8;
/// Radius of the mean filter that softens the feather mask
pub const FEATHER_BLUR_RADIUS: usize = 1;

/// Source images and camera for one generation pass
#[derive(Debug, Clone)]
pub struct PhotoInputs<'a, C, D, F> {
    /// Colour photo, used to texture the dense meshes and seed the extended background
    pub color: &'a C,
    /// Depth or disparity in the red channel
    pub depth: &'a D,
    /// Foreground matte in the alpha channel
    pub foreground: &'a F,
    pub fov: CameraFov,
}

/// Counts gathered during a generation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineDiagnostics {
    pub grid_width: usize,
    pub grid_height: usize,
    pub background_vertices: usize,
    pub foreground_triangles: usize,
    pub background_triangles: usize,
    pub outliers: Option<OutlierStats>,
    pub synthesis: SynthesisStats,
    pub foreground_simplification: Option<SimplificationStats>,
    pub background_simplification: Option<SimplificationStats>,
}

/// Dense, unsimplified meshes kept for driving an [`IncrementalSimplifier`] later
#[derive(Debug, Clone)]
pub struct DenseMeshData {
    /// Filtered dense grid; `background` is the foreground/background split
    pub grid: VertexGrid,
    pub foreground_faces: Vec<Face>,
    /// Extended background grid; `background` marks valid vertices
    pub extended: VertexGrid,
    pub extended_faces: Vec<Face>,
}

impl DenseMeshData {
    /// Step through the simplification of the foreground mesh
    pub fn foreground_steps(&self, simplifier: QuadtreeSimplifier) -> Result<IncrementalSimplifier> {
        IncrementalSimplifier::new(
            simplifier,
            &self.grid,
            self.foreground_faces.clone(),
            VertexSelection::foreground(),
        )
    }

    /// Step through the simplification of the extended background mesh
    pub fn background_steps(&self, simplifier: QuadtreeSimplifier) -> Result<IncrementalSimplifier> {
        IncrementalSimplifier::new(
            simplifier,
            &self.extended,
            self.extended_faces.clone(),
            VertexSelection::background(),
        )
    }
}

/// Handles and data produced by [`PhotoPipeline::generate`]
#[derive(Debug, Clone)]
pub struct GeneratedPhoto<H> {
    pub root: H,
    pub foreground: Option<H>,
    pub background: Option<H>,
    /// Set only when foreground and background are not separated
    pub unseparated: Option<H>,
    pub dense: DenseMeshData,
    pub diagnostics: PipelineDiagnostics,
}

/// Depth photo to textured mesh pipeline
#[derive(Debug, Clone, Default)]
pub struct PhotoPipeline {
    settings: Settings,
}

impl PhotoPipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn simplifier(&self) -> QuadtreeSimplifier {
        QuadtreeSimplifier::from_settings(&self.settings)
    }

    /// Project the depth map and run the configured cleanup filters
    pub fn build_dense_grid<D, F>(
        &self,
        depth: &D,
        foreground: &F,
        fov: CameraFov,
    ) -> Result<(VertexGrid, Option<OutlierStats>)>
    where
        D: ImageSource + Sync,
        F: ImageSource + Sync,
    {
        let mut grid = project_vertices(depth, foreground, fov, &self.settings)?;

        let outliers = if self.settings.remove_outliers {
            remove_background_outliers(&mut grid)
        } else {
            None
        };
        self.filter_grid(&mut grid);

        Ok((grid, outliers))
    }

    /// Run the enabled vertex filters in order
    pub fn filter_grid(&self, grid: &mut VertexGrid) {
        let settings = &self.settings;

        if settings.remove_outliers {
            grid.positions = filter_vertices(grid, true, BACKGROUND_MEDIAN_RADIUS, FilterKind::Median);
            for _ in 0..2 {
                grid.positions =
                    filter_vertices(grid, false, FOREGROUND_MEDIAN_RADIUS, FilterKind::Median);
            }
        }
        if settings.smooth_mesh {
            grid.positions = filter_vertices(grid, true, SMOOTHING_RADIUS, FilterKind::Mean);
            grid.positions = filter_vertices(grid, false, SMOOTHING_RADIUS, FilterKind::Mean);
        }
        if settings.smooth_foreground_edges {
            for _ in 0..2 {
                grid.positions =
                    filter_foreground_border_vertices(grid, BORDER_FILTER_RADIUS, FilterKind::Mean);
            }
        }
    }

    /// Generate the 3D photo and hand every mesh and texture to `sink`.
    ///
    /// Meshes are parented to a root object named [`ROOT_NAME`]. The
    /// foreground is textured with the source photo; the background with
    /// the extended background texture stored through the sink.
    pub fn generate<C, D, F, S>(
        &self,
        inputs: PhotoInputs<'_, C, D, F>,
        sink: &mut S,
    ) -> Result<GeneratedPhoto<S::MeshHandle>>
    where
        C: ImageSource + Sync,
        D: ImageSource + Sync,
        F: ImageSource + Sync,
        S: TextureSink + MeshSink<<S as TextureSink>::TextureHandle>,
    {
        let settings = &self.settings;
        let (grid, outliers) = self.build_dense_grid(inputs.depth, inputs.foreground, inputs.fov)?;
        let split = split_topology(&grid);

        let extended = synthesize_extended_background(
            &grid,
            inputs.color,
            inputs.fov,
            SynthesisOptions::from(settings),
        )?;

        let mut diagnostics = PipelineDiagnostics {
            grid_width: grid.width(),
            grid_height: grid.height(),
            background_vertices: grid.background_count(),
            foreground_triangles: split.foreground.len(),
            background_triangles: split.background.len(),
            outliers,
            synthesis: extended.stats,
            ..Default::default()
        };

        let root = sink.create_root(ROOT_NAME)?;
        let (mut foreground, mut background, mut unseparated) = (None, None, None);

        if !settings.separate_foreground_background {
            // Every quad, no split and no simplification
            let faces = all_triangles(grid.width(), grid.height());
            let mesh = TexturedMesh::from_parts(grid.positions.clone(), grid.uvs.clone(), faces)?;
            log_mesh(UNSEPARATED_NAME, &mesh);
            unseparated = Some(sink.create_mesh(
                UNSEPARATED_NAME,
                &mesh,
                MeshTexture::SourceColor,
                MeshMaterial::Unlit,
                Some(&root),
            )?);
        } else {
            if settings.generate_foreground {
                let material = self.foreground_material(inputs.foreground, sink)?;
                let mesh = self.foreground_mesh(&grid, &split.foreground, &mut diagnostics)?;
                log_mesh(FOREGROUND_NAME, &mesh);
                foreground = Some(sink.create_mesh(
                    FOREGROUND_NAME,
                    &mesh,
                    MeshTexture::SourceColor,
                    material,
                    Some(&root),
                )?);
            }

            if settings.generate_background {
                let texture_name = format!("{}_extendedBgTexture", settings.identifier);
                let texture = sink.store_texture(&texture_name, &extended.texture)?;
                let mesh = self.background_mesh(&extended, &mut diagnostics)?;
                log_mesh(BACKGROUND_NAME, &mesh);
                background = Some(sink.create_mesh(
                    BACKGROUND_NAME,
                    &mesh,
                    MeshTexture::Stored(texture),
                    MeshMaterial::Unlit,
                    Some(&root),
                )?);
            }
        }

        Ok(GeneratedPhoto {
            root,
            foreground,
            background,
            unseparated,
            dense: DenseMeshData {
                grid,
                foreground_faces: split.foreground,
                extended: extended.grid,
                extended_faces: extended.faces,
            },
            diagnostics,
        })
    }

    /// Feathered material backed by a stored feather mask, or unlit
    fn foreground_material<F, S>(
        &self,
        foreground: &F,
        sink: &mut S,
    ) -> Result<MeshMaterial<<S as TextureSink>::TextureHandle>>
    where
        F: ImageSource + Sync,
        S: TextureSink,
    {
        if !self.settings.foreground_feathering {
            return Ok(MeshMaterial::Unlit);
        }

        let mask = feather_mask(foreground, foreground.width(), foreground.height(), FEATHER_RADIUS)?;
        let mask = filter_image(&mask, None, false, FEATHER_BLUR_RADIUS, FilterKind::Mean)?;
        let name = format!("{}_featherMask", self.settings.identifier);
        let feather_mask = sink.store_texture(&name, &mask)?;
        Ok(MeshMaterial::Feathered { feather_mask })
    }

    fn foreground_mesh(
        &self,
        grid: &VertexGrid,
        faces: &[Face],
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<TexturedMesh> {
        if !self.settings.perform_simplification {
            return TexturedMesh::from_parts(grid.positions.clone(), grid.uvs.clone(), faces.to_vec());
        }

        let simplified = self.simplifier().simplify(grid, faces, VertexSelection::foreground())?;
        diagnostics.foreground_simplification = Some(simplified.stats);
        Ok(simplified.mesh)
    }

    fn background_mesh(
        &self,
        extended: &ExtendedBackground,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<TexturedMesh> {
        if !self.settings.perform_simplification {
            return TexturedMesh::from_parts(
                extended.grid.positions.clone(),
                extended.grid.uvs.clone(),
                extended.faces.clone(),
            );
        }

        let simplified = self.simplifier().simplify(
            &extended.grid,
            &extended.faces,
            VertexSelection::background(),
        )?;
        diagnostics.background_simplification = Some(simplified.stats);
        Ok(simplified.mesh)
    }
}

fn log_mesh(name: &str, mesh: &TexturedMesh) {
    log::info!(
        "{} mesh: {} vertices, {} triangles",
        name,
        mesh.vertex_count(),
        mesh.face_count()
    );
}
