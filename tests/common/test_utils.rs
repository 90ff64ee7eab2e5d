use std::collections::VecDeque;

use flashlight::{
    data_structures::heightmap::HeightMap,
    state::{GameState, StateKind, StateTable, Transition},
};

/// Context handed through the machine in tests. Records every lifecycle call
/// and lets a test script the transitions states ask for.
#[derive(Default)]
pub(crate) struct State {
    pub events: Vec<(StateKind, &'static str)>,
    pub constructed: Vec<(StateKind, Option<StateKind>)>,
    scripted: Vec<(StateKind, VecDeque<Transition>)>,
    pub fail_construction: Option<StateKind>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `transition` as the next update result of `kind`.
    pub fn script(&mut self, kind: StateKind, transition: Transition) {
        match self.scripted.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, queue)) => queue.push_back(transition),
            None => self.scripted.push((kind, VecDeque::from([transition]))),
        }
    }

    fn next_transition(&mut self, kind: StateKind) -> Transition {
        self.scripted
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: StateKind, event: &str) -> usize {
        self.events
            .iter()
            .filter(|(k, e)| *k == kind && *e == event)
            .count()
    }

    pub fn constructions(&self, kind: StateKind) -> usize {
        self.constructed.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

pub(crate) struct Recorder {
    kind: StateKind,
}

impl GameState<State> for Recorder {
    fn on_enter(&mut self, ctx: &mut State) {
        ctx.events.push((self.kind, "enter"));
    }

    fn on_exit(&mut self, ctx: &mut State) {
        ctx.events.push((self.kind, "exit"));
    }

    fn update(&mut self, ctx: &mut State) -> Transition {
        ctx.events.push((self.kind, "update"));
        ctx.next_transition(self.kind)
    }

    fn render(&self, ctx: &mut State) {
        ctx.events.push((self.kind, "render"));
    }
}

/// A table with a [`Recorder`] for every kind.
pub(crate) fn recording_table() -> StateTable<State> {
    let mut table = StateTable::new();
    for kind in StateKind::ALL {
        table.register(kind, move |ctx: &mut State, previous| {
            if ctx.fail_construction == Some(kind) {
                anyhow::bail!("{} assets missing", kind.name());
            }
            ctx.constructed.push((kind, previous));
            Ok(Box::new(Recorder { kind }) as Box<dyn GameState<State>>)
        });
    }
    table
}

/// Raw 0..=255 intensities to a heightmap.
pub(crate) fn heightmap_from_raster(width: u32, height: u32, raster: &[u8]) -> HeightMap {
    let samples = raster.iter().map(|v| *v as f32 / 255.0).collect();
    HeightMap::from_samples(width, height, samples).expect("valid heightmap")
}

/// A bumpy heightmap with every intensity above zero.
pub(crate) fn hills(width: u32, height: u32) -> HeightMap {
    let raster: Vec<u8> = (0..height)
        .flat_map(|row| {
            (0..width).map(move |column| {
                let x = column as f32 / width as f32 * std::f32::consts::TAU;
                let z = row as f32 / height as f32 * std::f32::consts::TAU;
                (128.0 + 100.0 * (x.sin() * z.cos())) as u8
            })
        })
        .collect();
    heightmap_from_raster(width, height, &raster)
}

/// Encodes a grayscale raster as PNG bytes.
pub(crate) fn png_bytes(width: u32, height: u32, raster: &[u8]) -> Vec<u8> {
    let image = image::GrayImage::from_raw(width, height, raster.to_vec()).expect("raster size");
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png encoding");
    bytes.into_inner()
}

pub(crate) const INTERFACE: &str = "\
- Widgets of the menu
TYPE >> MenuBackground
tag:menu
sprite:\ttextures/menu_background.png
----------END----------

TYPE >> MenuPlay
tag:Play
sprite:textures/button_play.png
transform.x:540
transform.y:300
width:200
height:60
action:play
tag:ignored
----------END----------

TYPE >> Unterminated
sprite:textures/lonely.png
TYPE >> AfterUnterminated
sprite:textures/after.png
----------END----------
<
TYPE >> PastEndOfFile
sprite:textures/never.png
----------END----------
";
