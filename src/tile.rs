use macroquad::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(0);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Stable handle of a tile inside its world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub(crate) usize);

impl TileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Opaque paint surface tiles are cut from.
pub trait TileSource {
    /// Square RGBA8 block of `size` pixels starting at `origin`. Pixels
    /// outside the surface read as transparent.
    fn read_tile(&self, origin: IVec2, size: u32) -> Vec<u8>;
}

impl TileSource for Image {
    fn read_tile(&self, origin: IVec2, size: u32) -> Vec<u8> {
        let size = size as i32;
        let width = self.width as i32;
        let height = self.height as i32;
        let mut out = vec![0u8; (size * size * 4) as usize];
        for y in 0..size {
            let sy = origin.y + y;
            if sy < 0 || sy >= height {
                continue;
            }
            for x in 0..size {
                let sx = origin.x + x;
                if sx < 0 || sx >= width {
                    continue;
                }
                let src = ((sy * width + sx) * 4) as usize;
                let dst = ((y * size + x) * 4) as usize;
                out[dst..dst + 4].copy_from_slice(&self.bytes[src..src + 4]);
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    id: TileId,
    data: Vec<u8>,
    revision: u64,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Changes whenever the payload is replaced. Unique across worlds, so
    /// it also tells apart tiles that reuse an id after a clear.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.revision = next_revision();
    }

    pub fn set_pixels(&mut self, source: &dyn TileSource, origin: IVec2, size: u32) {
        self.set_data(source.read_tile(origin, size));
    }

    pub fn fill_color(&mut self, color: Color, size: u32) {
        let rgba: [u8; 4] = color.into();
        self.set_data(rgba.repeat((size * size) as usize));
    }
}

/// Arena of tiles. Ids are handed out in order and never reused until
/// [`TileStore::clear`].
#[derive(Default)]
pub struct TileStore {
    tiles: Vec<Option<Tile>>,
}

impl TileStore {
    pub fn add(&mut self, data: Vec<u8>) -> TileId {
        let id = TileId(self.tiles.len());
        self.tiles.push(Some(Tile {
            id,
            data,
            revision: next_revision(),
        }));
        id
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0).and_then(|tile| tile.as_ref())
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.0).and_then(|tile| tile.as_mut())
    }

    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        self.tiles.get_mut(id.0).and_then(|tile| tile.take())
    }

    pub fn len(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u16, height: u16) -> Image {
        let mut image = Image::gen_image_color(width, height, BLACK);
        for y in 0..height as u32 {
            for x in 0..width as u32 {
                if (x + y) % 2 == 0 {
                    image.set_pixel(x, y, WHITE);
                }
            }
        }
        image
    }

    #[test]
    fn ids_are_sequential_and_not_reused() {
        let mut store = TileStore::default();
        let a = store.add(vec![1]);
        let b = store.add(vec![2]);
        assert_eq!(a.index() + 1, b.index());
        store.remove(a);
        let c = store.add(vec![3]);
        assert_ne!(c, a);
        assert!(store.get(a).is_none());
        assert_eq!(store.get(c).map(Tile::data), Some(&[3u8][..]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn image_source_copies_a_square() {
        let image = checker(4, 4);
        let data = image.read_tile(ivec2(1, 0), 2);
        assert_eq!(data.len(), 16);
        // (1,0) is black, (2,0) is white
        assert_eq!(&data[0..4], &[0, 0, 0, 255]);
        assert_eq!(&data[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn image_source_pads_outside_pixels() {
        let image = checker(2, 2);
        let data = image.read_tile(ivec2(1, 1), 2);
        assert_eq!(&data[0..4], &[255, 255, 255, 255]);
        assert!(data[4..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn fill_color_replaces_data() {
        let mut store = TileStore::default();
        let id = store.add(Vec::new());
        let tile = store.get_mut(id).unwrap();
        tile.fill_color(Color::new(1.0, 0.0, 0.0, 1.0), 2);
        assert_eq!(tile.data().len(), 16);
        assert_eq!(&tile.data()[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn every_rewrite_moves_the_revision() {
        let mut store = TileStore::default();
        let id = store.add(vec![0; 16]);
        let tile = store.get_mut(id).unwrap();
        let first = tile.revision();

        tile.set_pixels(&checker(2, 2), IVec2::ZERO, 2);
        let second = tile.revision();
        assert_ne!(first, second);
        assert_eq!(&tile.data()[0..4], &[255, 255, 255, 255]);

        tile.fill_color(BLACK, 2);
        assert_ne!(second, tile.revision());

        store.clear();
        let reused = store.add(Vec::new());
        assert_eq!(reused, id);
        assert!(store.get(reused).unwrap().revision() > first);
    }
}
