use macroquad::prelude::*;

/// Area shared by two boxes, zero when they only touch.
pub fn intersection_area(a: Rect, b: Rect) -> f32 {
    let w = a.right().min(b.right()) - a.left().max(b.left());
    let h = a.bottom().min(b.bottom()) - a.top().max(b.top());
    if w <= 0.0 || h <= 0.0 {
        return 0.0;
    }
    w * h
}

/// Displacement that moves `hitbox` back inside `bounds`. Boxes larger than
/// the bounds are aligned to the left/top edge.
pub fn clamp_hitbox_to_rect(hitbox: Rect, bounds: Rect) -> Vec2 {
    let mut delta = Vec2::ZERO;
    if hitbox.left() < bounds.left() {
        delta.x = bounds.left() - hitbox.left();
    } else if hitbox.right() > bounds.right() {
        delta.x = (bounds.right() - hitbox.right()).max(bounds.left() - hitbox.left());
    }
    if hitbox.top() < bounds.top() {
        delta.y = bounds.top() - hitbox.top();
    } else if hitbox.bottom() > bounds.bottom() {
        delta.y = (bounds.bottom() - hitbox.bottom()).max(bounds.top() - hitbox.top());
    }
    delta
}

pub fn merge_rect(a: Rect, b: Rect) -> Rect {
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    let right = a.right().max(b.right());
    let bottom = a.bottom().max(b.bottom());
    Rect::new(left, top, right - left, bottom - top)
}

pub fn rect_from_array(values: [f32; 4]) -> Rect {
    Rect::new(values[0], values[1], values[2], values[3])
}

pub fn draw_hitbox(hitbox: Rect, pos: Vec2, color: Color) {
    draw_rectangle_lines(hitbox.x + pos.x, hitbox.y + pos.y, hitbox.w, hitbox.h, 1.0, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_share_no_area() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        assert_eq!(intersection_area(a, Rect::new(16.0, 0.0, 4.0, 4.0)), 0.0);
        assert_eq!(intersection_area(a, Rect::new(12.0, 12.0, 8.0, 8.0)), 16.0);
    }

    #[test]
    fn clamp_pushes_back_inside() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            clamp_hitbox_to_rect(Rect::new(-4.0, 45.0, 8.0, 8.0), bounds),
            vec2(4.0, -3.0)
        );
        assert_eq!(clamp_hitbox_to_rect(Rect::new(10.0, 10.0, 8.0, 8.0), bounds), Vec2::ZERO);
    }

    #[test]
    fn merge_covers_both() {
        let merged = merge_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(8.0, -2.0, 2.0, 2.0));
        assert_eq!(merged, Rect::new(0.0, -2.0, 10.0, 6.0));
    }
}
