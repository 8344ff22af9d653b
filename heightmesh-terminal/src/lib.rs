/// Terminal front end: loads bitmaps, builds meshes and previews them as ASCII
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use heightmesh_core::{
    build_mosaic, BmpDecoder, Camera, HeightmapMeshBuilder, IndexedMesh, PixelGrid, RotationState,
    Transform,
};
use log::info;
use nalgebra::{Matrix4, Point3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod config;
pub mod renderer;

pub use config::{MeshMode, Settings};
pub use renderer::AsciiRenderer;

/// Decode `data` and build the mesh `settings` asks for
pub fn build_mesh(data: &[u8], settings: &Settings) -> anyhow::Result<(PixelGrid, IndexedMesh)> {
    let grid = BmpDecoder::new().decode(data)?;
    let grid = match settings.max_sample_size {
        Some(max) => {
            let sampled = grid.sample(max);
            if sampled.width() != grid.width() {
                info!(
                    "Sampled {}x{} down to {}x{}",
                    grid.width(),
                    grid.height(),
                    sampled.width(),
                    sampled.height()
                );
            }
            sampled
        }
        None => grid,
    };

    let placement = settings.world_width.map(|world_width| {
        let scale = world_width / grid.width().max(1) as f32;
        Transform::fit_image(
            Point3::origin(),
            0.0,
            grid.width(),
            grid.height(),
            world_width,
            grid.height() as f32 * scale,
            1.0,
        )
    });

    let mesh = match settings.mode {
        MeshMode::Heightmap => {
            let mut builder = HeightmapMeshBuilder::new(settings.height_scale)
                .with_uvs(settings.generate_uvs)
                .with_colors(true);
            if let Some(placement) = placement {
                builder = builder.with_transform(placement);
            }
            builder.build(&grid)
        }
        MeshMode::Mosaic => {
            let mosaic = build_mosaic(&grid);
            match placement {
                Some(placement) => mosaic.with_transform(&placement).to_indexed_mesh(),
                None => mosaic.to_indexed_mesh(),
            }
        }
    };

    Ok((grid, mesh))
}

/// One-paragraph description of a generated mesh
pub fn summary(grid: &PixelGrid, mesh: &IndexedMesh) -> String {
    let mut text = format!(
        "Image {}x{} ({} pixels)\nMesh: {} vertices, {} triangles, UVs: {}",
        grid.width(),
        grid.height(),
        grid.pixel_count(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        if mesh.has_uvs() { "yes" } else { "no" },
    );
    if let Some(bounds) = mesh.bounds() {
        let size = bounds.size();
        text.push_str(&format!(
            "\nBounds: {:.2} x {:.2} x {:.2}",
            size.x, size.y, size.z
        ));
    }
    text
}

/// Interactive ASCII preview of a mesh
pub struct TerminalApp {
    mesh: IndexedMesh,
    /// Moves the mesh center to the origin so rotation happens in place
    centering: Matrix4<f32>,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: IndexedMesh) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_viewport(mesh, width as usize, height as usize))
    }

    pub fn with_viewport(mesh: IndexedMesh, width: usize, height: usize) -> Self {
        let (centering, camera) = match mesh.bounds() {
            Some(bounds) => (
                Matrix4::new_translation(&-bounds.center().coords),
                Camera::framing(&bounds, width as u32, height as u32),
            ),
            None => (Matrix4::identity(), Camera::new(width as u32, height as u32)),
        };

        Self {
            mesh,
            centering,
            // Tilt so the relief is visible from the start
            rotation: RotationState::new(-0.9, 0.0, 0.3),
            camera,
            renderer: AsciiRenderer::new(width, height),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(width, height) => {
                        self.renderer.resize(width as usize, height as usize);
                        self.camera.aspect = width as f32 / height.max(1) as f32;
                    }
                    _ => {}
                }
            }

            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') | KeyCode::Up => self.rotation.rotate(0.1, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.rotation.rotate(-0.1, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.rotation.rotate(0.0, 0.0, -0.1),
            KeyCode::Char('d') | KeyCode::Right => self.rotation.rotate(0.0, 0.0, 0.1),
            KeyCode::Char('e') => self.rotation.rotate(0.0, 0.1, 0.0),
            KeyCode::Char('r') => self.rotation.rotate(0.0, -0.1, 0.0),
            KeyCode::Char('p') => self.camera.mode = self.camera.mode.toggled(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.camera.zoom(0.9),
            KeyCode::Char('-') => self.camera.zoom(1.1),
            _ => {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.rotation) * self.centering
    }

    fn render(&mut self) -> io::Result<()> {
        let model = self.model_matrix();

        self.renderer.clear();
        self.renderer.render_mesh(&self.mesh, &model, &self.camera);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Heightmesh | {} tris | {:?} | FPS: {:.1} | WASD/Arrows=Rotate E/R=Roll P=Projection +/-=Zoom Q=Quit",
                self.mesh.triangle_count(),
                self.camera.mode,
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
