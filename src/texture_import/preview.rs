//! # 预览图模块
//!
//! ## 设计思路
//!
//! - 等待图在整个进程内只生成一次，之后只读共享（`once_cell::sync::Lazy`）。
//! - 属性页预览按“贴在 250 cm 宽的墙面上”的比例平铺贴图，白色背景。

use std::sync::Arc;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use once_cell::sync::Lazy;

use super::source::DecodedImage;

/// 预览区边长（像素）。
pub const PREVIEW_SIZE: u32 = 150;
/// 属性预览模拟的墙面宽度（厘米）。
pub const PREVIEW_WALL_SIZE: f32 = 250.0;

const WAIT_IMAGE_SIZE: u32 = 32;

/// 加载期间显示的等待图。首次访问时生成。
static WAIT_IMAGE: Lazy<Arc<DecodedImage>> = Lazy::new(|| {
    log::debug!("⏳ 生成等待图");
    Arc::new(DecodedImage::new(DynamicImage::ImageRgba8(draw_hourglass(
        WAIT_IMAGE_SIZE,
    ))))
});

pub fn waiting_image() -> Arc<DecodedImage> {
    Arc::clone(&WAIT_IMAGE)
}

/// 沙漏形状：上下两个三角形，中心收窄。
fn draw_hourglass(size: u32) -> RgbaImage {
    let center = (size as f32 - 1.0) / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f32 - center).abs();
        let dy = (y as f32 - center).abs();
        let border = x == 0 || y == 0 || x == size - 1 || y == size - 1;
        if border {
            Rgba([96, 96, 96, 255])
        } else if dx <= dy {
            Rgba([160, 160, 160, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// 预览区当前显示的内容。
#[derive(Debug, Clone, Default)]
pub enum PreviewImage {
    #[default]
    Empty,
    Waiting(Arc<DecodedImage>),
    Loaded(Arc<DecodedImage>),
}

impl PreviewImage {
    pub fn waiting() -> Self {
        Self::Waiting(waiting_image())
    }

    pub fn image(&self) -> Option<&Arc<DecodedImage>> {
        match self {
            Self::Empty => None,
            Self::Waiting(image) | Self::Loaded(image) => Some(image),
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// 渲染属性页预览：贴图按 `width × height`（厘米）平铺在 250 cm 墙面上。
pub fn render_attributes_preview(texture: Option<&DecodedImage>, width: f32, height: f32) -> RgbImage {
    let mut preview = RgbImage::from_pixel(PREVIEW_SIZE, PREVIEW_SIZE, Rgb([255, 255, 255]));
    let Some(texture) = texture else {
        return preview;
    };

    let tile_width = width / PREVIEW_WALL_SIZE * PREVIEW_SIZE as f32;
    let tile_height = height / PREVIEW_WALL_SIZE * PREVIEW_SIZE as f32;
    if !(tile_width > 0.0 && tile_height > 0.0) {
        return preview;
    }

    let (texture_width, texture_height) = texture.dimensions();
    let pixels = texture.pixels();
    for (x, y, pixel) in preview.enumerate_pixels_mut() {
        let u = (x as f32 % tile_width) / tile_width;
        let v = (y as f32 % tile_height) / tile_height;
        let tx = ((u * texture_width as f32) as u32).min(texture_width - 1);
        let ty = ((v * texture_height as f32) as u32).min(texture_height - 1);
        let Rgba([r, g, b, a]) = pixels.get_pixel(tx, ty);
        // 在白色背景上做 alpha 混合
        let blend = |c: u8| -> u8 { ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8 };
        *pixel = Rgb([blend(r), blend(g), blend(b)]);
    }

    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_image_is_shared() {
        let first = waiting_image();
        let second = waiting_image();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.dimensions(), (WAIT_IMAGE_SIZE, WAIT_IMAGE_SIZE));
        assert!(PreviewImage::waiting().is_waiting());
    }

    #[test]
    fn empty_preview_is_white() {
        let preview = render_attributes_preview(None, 20.0, 10.0);

        assert_eq!(preview.dimensions(), (PREVIEW_SIZE, PREVIEW_SIZE));
        assert!(preview.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn texture_is_tiled_by_wall_scale() {
        // 左半黑、右半红：250 cm 墙上 125 cm 宽的贴图恰好铺两次
        let texture = DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 0, 0]) }
        })));

        let preview = render_attributes_preview(Some(&texture), 125.0, 125.0);

        assert_eq!(*preview.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*preview.get_pixel(50, 0), Rgb([255, 0, 0]));
        assert_eq!(*preview.get_pixel(75, 0), Rgb([0, 0, 0]));
        assert_eq!(*preview.get_pixel(149, 149), Rgb([255, 0, 0]));
    }
}
