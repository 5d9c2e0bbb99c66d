//! Display entities: block, item and text displays
//!
//! Displays carry no simulation behaviour of their own. Their synchronized
//! attributes describe how they should look; each tick the render-state
//! engine turns attribute changes into a fresh snapshot, and a pending
//! position/rotation target moves the entity toward a teleport destination.

use crate::error::{Error, Result};
use crate::pos_rot::{PosRotInterpolationTarget, MAX_POS_ROT_STEPS};
use crate::render_state::{
    align_from_flags, text_flags, BillboardConstraints, Brightness, RenderState,
    RenderStateEngine, TextAlign,
};
use mobtick_core::codec::vec3_value;
use mobtick_core::{
    Authority, DVec3, EntityBase, FieldReader, Quat, SyncedStore, Transformation, Value,
    ValueMap, Vec3,
};
use tracing::debug;

mobtick_core::attribute_keys! {
    /// Synchronized attributes of display entities
    pub enum DisplayKey {
        PosRotInterpolationDuration => "PosRotInterpolationDuration",
        InterpolationStartDelta => "InterpolationStartDelta",
        InterpolationDuration => "InterpolationDuration",
        Translation => "Translation",
        Scale => "Scale",
        LeftRotation => "LeftRotation",
        RightRotation => "RightRotation",
        Billboard => "Billboard",
        BrightnessOverride => "BrightnessOverride",
        ViewRange => "ViewRange",
        ShadowRadius => "ShadowRadius",
        ShadowStrength => "ShadowStrength",
        Width => "Width",
        Height => "Height",
        GlowColorOverride => "GlowColorOverride",
        BlockState => "BlockState",
        ItemStack => "ItemStack",
        ItemContext => "ItemContext",
        Text => "Text",
        LineWidth => "LineWidth",
        BackgroundColor => "BackgroundColor",
        TextOpacity => "TextOpacity",
        StyleFlags => "StyleFlags",
    }
}

/// Default text background, translucent black
pub const DEFAULT_BACKGROUND: i32 = 0x4000_0000;

/// Default wrap width for text displays
pub const DEFAULT_LINE_WIDTH: i32 = 200;

/// Item display contexts, indexed by their synchronized byte
pub const ITEM_CONTEXTS: [&str; 9] = [
    "none",
    "thirdperson_lefthand",
    "thirdperson_righthand",
    "firstperson_lefthand",
    "firstperson_righthand",
    "head",
    "gui",
    "ground",
    "fixed",
];

/// Which display variant an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayKind {
    Block,
    Item,
    Text,
}

impl DisplayKind {
    pub fn name(self) -> &'static str {
        match self {
            DisplayKind::Block => "block",
            DisplayKind::Item => "item",
            DisplayKind::Text => "text",
        }
    }
}

/// Register every attribute a display of `kind` uses
pub fn define_display_keys(
    store: &mut SyncedStore<DisplayKey>,
    kind: DisplayKind,
) -> mobtick_core::Result<()> {
    store.define(DisplayKey::PosRotInterpolationDuration, 0i32)?;
    store.define(DisplayKey::InterpolationStartDelta, 0i32)?;
    store.define(DisplayKey::InterpolationDuration, 0i32)?;
    store.define(DisplayKey::Translation, Vec3::ZERO)?;
    store.define(DisplayKey::Scale, Vec3::ONE)?;
    store.define(DisplayKey::LeftRotation, Quat::IDENTITY)?;
    store.define(DisplayKey::RightRotation, Quat::IDENTITY)?;
    store.define(DisplayKey::Billboard, BillboardConstraints::Fixed.id())?;
    store.define(DisplayKey::BrightnessOverride, -1i32)?;
    store.define(DisplayKey::ViewRange, 1.0f32)?;
    store.define(DisplayKey::ShadowRadius, 0.0f32)?;
    store.define(DisplayKey::ShadowStrength, 1.0f32)?;
    store.define(DisplayKey::Width, 0.0f32)?;
    store.define(DisplayKey::Height, 0.0f32)?;
    store.define(DisplayKey::GlowColorOverride, -1i32)?;
    match kind {
        DisplayKind::Block => {
            store.define(DisplayKey::BlockState, "air")?;
        }
        DisplayKind::Item => {
            store.define(DisplayKey::ItemStack, "")?;
            store.define(DisplayKey::ItemContext, 0i8)?;
        }
        DisplayKind::Text => {
            store.define(DisplayKey::Text, "")?;
            store.define(DisplayKey::LineWidth, DEFAULT_LINE_WIDTH)?;
            store.define(DisplayKey::BackgroundColor, DEFAULT_BACKGROUND)?;
            store.define(DisplayKey::TextOpacity, -1i8)?;
            store.define(DisplayKey::StyleFlags, 0i8)?;
        }
    }
    Ok(())
}

/// Something a renderer can draw from a snapshot
pub trait Displayable {
    /// Latest snapshot; `None` before the first tick
    fn render_state(&self) -> Option<&RenderState>;

    /// Interpolation progress at a sub-tick instant
    fn render_progress(&mut self, partial_tick: f32) -> f32;

    /// View distance multiplier
    fn view_range(&self) -> f32;
}

/// A block, item or text display
#[derive(Debug)]
pub struct DisplayEntity {
    pub base: EntityBase,
    kind: DisplayKind,
    store: SyncedStore<DisplayKey>,
    engine: RenderStateEngine,
    pos_rot: Option<PosRotInterpolationTarget>,
}

impl DisplayEntity {
    /// Authoritative display
    pub fn new(base: EntityBase, kind: DisplayKind) -> Result<Self> {
        Self::with_authority(base, kind, Authority::Server)
    }

    /// Display backed by a store of the given authority; client copies
    /// receive their attributes through `assign_values`
    pub fn with_authority(base: EntityBase, kind: DisplayKind, authority: Authority) -> Result<Self> {
        let mut store = SyncedStore::with_authority(authority);
        define_display_keys(&mut store, kind)?;
        Ok(Self {
            base,
            kind,
            store,
            engine: RenderStateEngine::new(),
            pos_rot: None,
        })
    }

    pub fn kind(&self) -> DisplayKind {
        self.kind
    }

    pub fn store(&self) -> &SyncedStore<DisplayKey> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SyncedStore<DisplayKey> {
        &mut self.store
    }

    pub fn engine(&self) -> &RenderStateEngine {
        &self.engine
    }

    pub fn pos_rot_target(&self) -> Option<&PosRotInterpolationTarget> {
        self.pos_rot.as_ref()
    }

    /// Per-tick update: react to attribute changes, then step any pending move
    pub fn tick(&mut self) -> Result<()> {
        let changes = self.store.take_changes();
        if changes.any(&[DisplayKey::Width, DisplayKey::Height]) {
            let width = self.store.get_float(DisplayKey::Width)?;
            let height = self.store.get_float(DisplayKey::Height)?;
            self.base.set_dimensions(width, height);
        }
        self.engine.observe(&changes);
        self.engine
            .update(self.base.tick_count, &self.store, self.kind)?;

        if let Some(target) = self.pos_rot.as_mut() {
            if target.step(&mut self.base) {
                debug!(entity = %self.base.id, "teleport interpolation finished");
                self.pos_rot = None;
            }
        }
        Ok(())
    }

    /// Start moving toward `pos` over the configured teleport duration
    pub fn lerp_to(&mut self, pos: DVec3, y_rot: f32, x_rot: f32) -> Result<()> {
        let steps = self.store.get_int(DisplayKey::PosRotInterpolationDuration)?;
        self.pos_rot = Some(PosRotInterpolationTarget::new(steps, pos, y_rot, x_rot));
        Ok(())
    }

    pub fn transformation(&self) -> Result<Transformation> {
        Ok(Transformation::new(
            self.store.get_vector(DisplayKey::Translation)?,
            self.store.get_rotation(DisplayKey::LeftRotation)?,
            self.store.get_vector(DisplayKey::Scale)?,
            self.store.get_rotation(DisplayKey::RightRotation)?,
        ))
    }

    pub fn set_transformation(&mut self, t: Transformation) -> Result<()> {
        self.store.set(DisplayKey::Translation, t.translation)?;
        self.store.set(DisplayKey::LeftRotation, t.left_rotation)?;
        self.store.set(DisplayKey::Scale, t.scale)?;
        self.store.set(DisplayKey::RightRotation, t.right_rotation)?;
        Ok(())
    }

    pub fn set_interpolation_duration(&mut self, ticks: i32) -> Result<()> {
        Ok(self.store.set(DisplayKey::InterpolationDuration, ticks)?)
    }

    /// Restart the interpolation window `ticks` from now, even if the delay is unchanged
    pub fn set_interpolation_delay(&mut self, ticks: i32) -> Result<()> {
        Ok(self.store.set_forced(DisplayKey::InterpolationStartDelta, ticks)?)
    }

    pub fn set_pos_rot_interpolation_duration(&mut self, ticks: i32) -> Result<()> {
        Ok(self.store.set(
            DisplayKey::PosRotInterpolationDuration,
            ticks.clamp(0, MAX_POS_ROT_STEPS),
        )?)
    }

    pub fn billboard(&self) -> Result<BillboardConstraints> {
        Ok(BillboardConstraints::from_id(self.store.get_byte(DisplayKey::Billboard)?))
    }

    pub fn set_billboard(&mut self, billboard: BillboardConstraints) -> Result<()> {
        Ok(self.store.set(DisplayKey::Billboard, billboard.id())?)
    }

    pub fn brightness_override(&self) -> Result<Option<Brightness>> {
        let packed = self.store.get_int(DisplayKey::BrightnessOverride)?;
        Ok((packed != -1).then(|| Brightness::unpack(packed)))
    }

    pub fn set_brightness_override(&mut self, brightness: Option<Brightness>) -> Result<()> {
        let packed = brightness.map_or(-1, Brightness::pack);
        Ok(self.store.set(DisplayKey::BrightnessOverride, packed)?)
    }

    pub fn set_view_range(&mut self, range: f32) -> Result<()> {
        Ok(self.store.set(DisplayKey::ViewRange, range)?)
    }

    pub fn set_shadow_radius(&mut self, radius: f32) -> Result<()> {
        Ok(self.store.set(DisplayKey::ShadowRadius, radius)?)
    }

    pub fn set_shadow_strength(&mut self, strength: f32) -> Result<()> {
        Ok(self.store.set(DisplayKey::ShadowStrength, strength)?)
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> Result<()> {
        self.store.set(DisplayKey::Width, width)?;
        self.store.set(DisplayKey::Height, height)?;
        Ok(())
    }

    pub fn set_glow_color_override(&mut self, color: i32) -> Result<()> {
        Ok(self.store.set(DisplayKey::GlowColorOverride, color)?)
    }

    pub fn set_block_state(&mut self, block_state: &str) -> Result<()> {
        self.require(DisplayKind::Block, "set_block_state")?;
        Ok(self.store.set(DisplayKey::BlockState, block_state)?)
    }

    pub fn set_item(&mut self, item: &str) -> Result<()> {
        self.require(DisplayKind::Item, "set_item")?;
        Ok(self.store.set(DisplayKey::ItemStack, item)?)
    }

    /// Unknown contexts are stored as `none`
    pub fn set_item_context(&mut self, context: &str) -> Result<()> {
        self.require(DisplayKind::Item, "set_item_context")?;
        let id = ITEM_CONTEXTS.iter().position(|c| *c == context).unwrap_or(0);
        Ok(self.store.set(DisplayKey::ItemContext, id as i8)?)
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.require(DisplayKind::Text, "set_text")?;
        Ok(self.store.set(DisplayKey::Text, text)?)
    }

    pub fn set_line_width(&mut self, width: i32) -> Result<()> {
        self.require(DisplayKind::Text, "set_line_width")?;
        Ok(self.store.set(DisplayKey::LineWidth, width)?)
    }

    pub fn set_background_color(&mut self, argb: i32) -> Result<()> {
        self.require(DisplayKind::Text, "set_background_color")?;
        Ok(self.store.set(DisplayKey::BackgroundColor, argb)?)
    }

    pub fn set_text_opacity(&mut self, opacity: i8) -> Result<()> {
        self.require(DisplayKind::Text, "set_text_opacity")?;
        Ok(self.store.set(DisplayKey::TextOpacity, opacity)?)
    }

    pub fn set_style_flags(&mut self, flags: u8) -> Result<()> {
        self.require(DisplayKind::Text, "set_style_flags")?;
        Ok(self.store.set(DisplayKey::StyleFlags, flags as i8)?)
    }

    fn require(&self, kind: DisplayKind, operation: &'static str) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::WrongDisplayKind {
                operation,
                kind: self.kind.name(),
            })
        }
    }

    pub fn save(&self, out: &mut ValueMap) -> Result<()> {
        self.base.save(out);
        let t = self.transformation()?;
        let mut transformation = ValueMap::new();
        transformation.insert("translation".into(), vec3f_value(t.translation));
        transformation.insert("left_rotation".into(), quat_value(t.left_rotation));
        transformation.insert("scale".into(), vec3f_value(t.scale));
        transformation.insert("right_rotation".into(), quat_value(t.right_rotation));
        out.insert("transformation".into(), Value::Map(transformation));

        let store = &self.store;
        out.insert(
            "interpolation_duration".into(),
            store.get_int(DisplayKey::InterpolationDuration)?.into(),
        );
        out.insert(
            "teleport_duration".into(),
            store.get_int(DisplayKey::PosRotInterpolationDuration)?.into(),
        );
        out.insert("billboard".into(), self.billboard()?.name().into());
        out.insert("view_range".into(), store.get_float(DisplayKey::ViewRange)?.into());
        out.insert("shadow_radius".into(), store.get_float(DisplayKey::ShadowRadius)?.into());
        out.insert(
            "shadow_strength".into(),
            store.get_float(DisplayKey::ShadowStrength)?.into(),
        );
        out.insert("width".into(), store.get_float(DisplayKey::Width)?.into());
        out.insert("height".into(), store.get_float(DisplayKey::Height)?.into());
        out.insert(
            "glow_color_override".into(),
            store.get_int(DisplayKey::GlowColorOverride)?.into(),
        );
        if let Some(brightness) = self.brightness_override()? {
            let mut map = ValueMap::new();
            map.insert("block".into(), (brightness.block as i32).into());
            map.insert("sky".into(), (brightness.sky as i32).into());
            out.insert("brightness".into(), Value::Map(map));
        }

        match self.kind {
            DisplayKind::Block => {
                out.insert("block_state".into(), store.get_text(DisplayKey::BlockState)?.into());
            }
            DisplayKind::Item => {
                out.insert("item".into(), store.get_text(DisplayKey::ItemStack)?.into());
                let context = store.get_byte(DisplayKey::ItemContext)?;
                let name = ITEM_CONTEXTS.get(context as usize).copied().unwrap_or("none");
                out.insert("item_display".into(), name.into());
            }
            DisplayKind::Text => {
                let flags = store.get_byte(DisplayKey::StyleFlags)? as u8;
                out.insert("text".into(), store.get_text(DisplayKey::Text)?.into());
                out.insert("line_width".into(), store.get_int(DisplayKey::LineWidth)?.into());
                out.insert(
                    "background".into(),
                    store.get_int(DisplayKey::BackgroundColor)?.into(),
                );
                out.insert(
                    "text_opacity".into(),
                    (store.get_byte(DisplayKey::TextOpacity)? as i32).into(),
                );
                out.insert("shadow".into(), (flags & text_flags::SHADOW != 0).into());
                out.insert("see_through".into(), (flags & text_flags::SEE_THROUGH != 0).into());
                out.insert(
                    "default_background".into(),
                    (flags & text_flags::DEFAULT_BACKGROUND != 0).into(),
                );
                let alignment = match align_from_flags(flags) {
                    TextAlign::Center => "center",
                    TextAlign::Left => "left",
                    TextAlign::Right => "right",
                };
                out.insert("alignment".into(), alignment.into());
            }
        }
        Ok(())
    }

    /// Restore from saved fields; malformed fields are reported and skipped
    pub fn load(&mut self, input: &FieldReader<'_>) -> Result<()> {
        self.base.load(input);

        if let Some(t) = input.map("transformation") {
            match read_transformation(&t) {
                Some(transformation) => self.set_transformation(transformation)?,
                None => input.corrupt("transformation", "incomplete transformation"),
            }
        }
        if input.contains("interpolation_duration") {
            self.set_interpolation_duration(input.int32("interpolation_duration", 0))?;
        }
        if input.contains("start_interpolation") {
            self.set_interpolation_delay(input.int32("start_interpolation", 0))?;
        }
        if input.contains("teleport_duration") {
            self.set_pos_rot_interpolation_duration(input.int32("teleport_duration", 0))?;
        }
        if let Some(name) = input.string("billboard") {
            match BillboardConstraints::from_name(name) {
                Some(billboard) => self.set_billboard(billboard)?,
                None => input.corrupt("billboard", "unknown billboard mode"),
            }
        }
        if input.contains("view_range") {
            self.set_view_range(input.float32("view_range", 1.0))?;
        }
        if input.contains("shadow_radius") {
            self.set_shadow_radius(input.float32("shadow_radius", 0.0))?;
        }
        if input.contains("shadow_strength") {
            self.set_shadow_strength(input.float32("shadow_strength", 1.0))?;
        }
        let width = input.float32("width", 0.0);
        let height = input.float32("height", 0.0);
        self.set_size(width, height)?;
        if input.contains("glow_color_override") {
            self.set_glow_color_override(input.int32("glow_color_override", -1))?;
        }
        if let Some(brightness) = input.map("brightness") {
            let block = brightness.int32("block", 0).clamp(0, 15) as u8;
            let sky = brightness.int32("sky", 0).clamp(0, 15) as u8;
            self.set_brightness_override(Some(Brightness::new(block, sky)))?;
        }

        match self.kind {
            DisplayKind::Block => {
                if let Some(state) = input.string("block_state") {
                    self.set_block_state(state)?;
                }
            }
            DisplayKind::Item => {
                if let Some(item) = input.string("item") {
                    self.set_item(item)?;
                }
                if let Some(context) = input.string("item_display") {
                    if !ITEM_CONTEXTS.contains(&context) {
                        input.corrupt("item_display", "unknown display context");
                    }
                    self.set_item_context(context)?;
                }
            }
            DisplayKind::Text => {
                if let Some(text) = input.string("text") {
                    self.set_text(text)?;
                }
                if input.contains("line_width") {
                    self.set_line_width(input.int32("line_width", DEFAULT_LINE_WIDTH))?;
                }
                if input.contains("background") {
                    self.set_background_color(input.int32("background", DEFAULT_BACKGROUND))?;
                }
                if input.contains("text_opacity") {
                    self.set_text_opacity(input.int32("text_opacity", -1) as i8)?;
                }
                let mut flags = 0u8;
                if input.bool("shadow", false) {
                    flags |= text_flags::SHADOW;
                }
                if input.bool("see_through", false) {
                    flags |= text_flags::SEE_THROUGH;
                }
                if input.bool("default_background", false) {
                    flags |= text_flags::DEFAULT_BACKGROUND;
                }
                match input.string("alignment") {
                    Some("left") => flags |= text_flags::ALIGN_LEFT,
                    Some("right") => flags |= text_flags::ALIGN_RIGHT,
                    Some("center") | None => {}
                    Some(_) => input.corrupt("alignment", "unknown alignment"),
                }
                self.set_style_flags(flags)?;
            }
        }
        Ok(())
    }
}

impl Displayable for DisplayEntity {
    fn render_state(&self) -> Option<&RenderState> {
        self.engine.state()
    }

    fn render_progress(&mut self, partial_tick: f32) -> f32 {
        self.engine.progress(self.base.tick_count, partial_tick)
    }

    fn view_range(&self) -> f32 {
        self.store.get_float(DisplayKey::ViewRange).unwrap_or(1.0)
    }
}

fn vec3f_value(v: Vec3) -> Value {
    vec3_value(v.x as f64, v.y as f64, v.z as f64)
}

fn quat_value(q: Quat) -> Value {
    Value::List(vec![
        Value::from(q.x),
        Value::from(q.y),
        Value::from(q.z),
        Value::from(q.w),
    ])
}

fn read_quat(input: &FieldReader<'_>, key: &str) -> Option<Quat> {
    let list = input.list(key)?;
    let mut parts = [0.0f32; 4];
    if list.len() != 4 {
        return None;
    }
    for (slot, value) in parts.iter_mut().zip(list) {
        *slot = value.as_float()? as f32;
    }
    Some(Quat::from_array(parts).normalize())
}

fn read_transformation(input: &FieldReader<'_>) -> Option<Transformation> {
    let [tx, ty, tz] = input.vec3("translation")?;
    let [sx, sy, sz] = input.vec3("scale")?;
    Some(Transformation::new(
        Vec3::new(tx as f32, ty as f32, tz as f32),
        read_quat(input, "left_rotation")?,
        Vec3::new(sx as f32, sy as f32, sz as f32),
        read_quat(input, "right_rotation")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_state::SubRenderState;
    use mobtick_core::{AttributeKey, EntityId, GameRng, RonCodec, PersistenceCodec};
    use uuid::Uuid;

    fn display(kind: DisplayKind) -> DisplayEntity {
        let base = EntityBase::new(
            EntityId(3),
            Uuid::new_v4(),
            "text_display",
            0.0,
            0.0,
            Box::new(GameRng::new(3)),
        );
        DisplayEntity::new(base, kind).unwrap()
    }

    #[test]
    fn test_key_table() {
        assert_eq!(DisplayKey::COUNT, 23);
        assert_eq!(DisplayKey::from_index(3), Some(DisplayKey::Translation));
        assert_eq!(DisplayKey::StyleFlags.name(), "StyleFlags");
    }

    #[test]
    fn test_first_tick_builds_snapshot() {
        let mut d = display(DisplayKind::Text);
        assert!(d.render_state().is_none());
        d.base.begin_tick(mobtick_core::TickMode::Active);
        d.tick().unwrap();
        let state = d.render_state().unwrap();
        assert_eq!(state.billboard, BillboardConstraints::Fixed);
        assert!(matches!(state.sub, SubRenderState::Text(_)));
    }

    #[test]
    fn test_writes_batch_into_one_rebuild() {
        let mut d = display(DisplayKind::Block);
        d.tick().unwrap();
        d.set_billboard(BillboardConstraints::Center).unwrap();
        d.set_shadow_radius(2.0).unwrap();
        d.set_block_state("stone").unwrap();
        assert_eq!(
            d.render_state().unwrap().billboard,
            BillboardConstraints::Fixed
        );
        d.tick().unwrap();
        let state = d.render_state().unwrap();
        assert_eq!(state.billboard, BillboardConstraints::Center);
        assert_eq!(state.shadow_radius.get(1.0), 2.0);
        assert!(matches!(state.sub, SubRenderState::Block { ref block_state } if block_state == "stone"));
    }

    #[test]
    fn test_wrong_kind_setter() {
        let mut d = display(DisplayKind::Block);
        assert!(matches!(
            d.set_text("hello"),
            Err(Error::WrongDisplayKind { operation: "set_text", kind: "block" })
        ));
    }

    #[test]
    fn test_size_change_resizes_entity() {
        let mut d = display(DisplayKind::Item);
        d.set_size(2.0, 3.0).unwrap();
        d.tick().unwrap();
        assert_eq!(d.base.width, 2.0);
        assert_eq!(d.base.height, 3.0);
    }

    #[test]
    fn test_lerp_to_uses_teleport_duration() {
        let mut d = display(DisplayKind::Block);
        d.set_pos_rot_interpolation_duration(2).unwrap();
        d.lerp_to(DVec3::new(4.0, 0.0, 0.0), 0.0, 0.0).unwrap();
        d.tick().unwrap();
        assert_eq!(d.base.pos.x, 2.0);
        d.tick().unwrap();
        assert_eq!(d.base.pos.x, 4.0);
        assert!(d.pos_rot_target().is_none());
    }

    #[test]
    fn test_client_copy_follows_replication() {
        let mut server = display(DisplayKind::Text);
        let base = EntityBase::new(
            EntityId(3),
            Uuid::new_v4(),
            "text_display",
            0.0,
            0.0,
            Box::new(GameRng::new(3)),
        );
        let mut client = DisplayEntity::with_authority(base, DisplayKind::Text, Authority::Client).unwrap();
        assert!(client.set_text("nope").is_err());

        server.set_text("hello").unwrap();
        let delta = server.store_mut().pack_dirty().unwrap();
        client.store_mut().assign_values(&delta).unwrap();
        client.tick().unwrap();
        match &client.render_state().unwrap().sub {
            SubRenderState::Text(text) => assert_eq!(text.text, "hello"),
            other => panic!("unexpected sub state {other:?}"),
        }
    }

    #[test]
    fn test_save_load() {
        let mut d = display(DisplayKind::Text);
        d.set_text("hi").unwrap();
        d.set_billboard(BillboardConstraints::Vertical).unwrap();
        d.set_brightness_override(Some(Brightness::new(15, 3))).unwrap();
        d.set_style_flags(text_flags::SHADOW | text_flags::ALIGN_RIGHT).unwrap();
        d.set_transformation(Transformation::new(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::IDENTITY,
            Vec3::splat(2.0),
            Quat::IDENTITY,
        ))
        .unwrap();
        let mut map = ValueMap::new();
        d.save(&mut map).unwrap();
        let blob = RonCodec.write_attributes(&map).unwrap();
        let map = RonCodec.read_attributes(&blob).unwrap();

        let mut restored = display(DisplayKind::Text);
        restored.load(&FieldReader::new(&map, "text_display")).unwrap();
        assert_eq!(restored.billboard().unwrap(), BillboardConstraints::Vertical);
        assert_eq!(
            restored.brightness_override().unwrap(),
            Some(Brightness::new(15, 3))
        );
        assert_eq!(restored.transformation().unwrap().scale, Vec3::splat(2.0));
        let store = restored.store();
        assert_eq!(store.get_text(DisplayKey::Text).unwrap(), "hi");
        assert_eq!(
            store.get_byte(DisplayKey::StyleFlags).unwrap() as u8,
            text_flags::SHADOW | text_flags::ALIGN_RIGHT
        );
    }

    #[test]
    fn test_load_skips_bad_fields() {
        let mut map = ValueMap::new();
        map.insert("billboard".into(), "sideways".into());
        map.insert("teleport_duration".into(), Value::Int(400));
        map.insert("view_range".into(), "far".into());
        let mut d = display(DisplayKind::Block);
        d.load(&FieldReader::new(&map, "block_display")).unwrap();
        assert_eq!(d.billboard().unwrap(), BillboardConstraints::Fixed);
        assert_eq!(
            d.store().get_int(DisplayKey::PosRotInterpolationDuration).unwrap(),
            MAX_POS_ROT_STEPS
        );
        assert_eq!(d.store().get_float(DisplayKey::ViewRange).unwrap(), 1.0);
    }
}
