//! Headless ball pit: a box of bouncing balls with a few static obstacles.
//!
//! Scripts the interactions a windowed test scene would do with the mouse
//! (grab and drag a ball, flick one, pan the whole scene)
//! and prints where things ended up.

use rand::{distributions as distr, distributions::Distribution, SeedableRng};

use quasi_physics::{
    math as m,
    physics::{
        self as phys,
        collision::{Circle, Edge},
    },
};

const WIDTH: f64 = 80.0;
const HEIGHT: f64 = 60.0;
const DYNAMIC_BALLS: usize = 60;
const STATIC_BALLS: usize = 4;
const FRAME_RATE: f64 = 60.0;

fn main() {
    let mut world = phys::World::new(
        phys::WorldParams::default()
            .with_gravity(m::Vec2::new(0.0, -40.0))
            .with_frame_drag(0.98, FRAME_RATE)
            .with_broad_phase(phys::BroadPhaseMethod::Grid { cell_size: 6.0 }),
    );
    let walls = build_walls(&mut world);
    reset_balls(&mut world, 7);

    let dt = 1.0 / FRAME_RATE;
    let run = |world: &mut phys::World, frames: usize| {
        for _ in 0..frames {
            world.update(dt, 8, 2);
        }
    };

    run(&mut world, 120);
    report("settled", &world);

    // left click: grab whatever is under the cursor and drag it to the middle of the box
    let cursor = m::Vec2::new(WIDTH / 2.0, 8.0);
    match world.find_body_at(cursor) {
        Some(key) if is_dynamic(&world, key) => {
            let target = m::Vec2::new(WIDTH / 2.0, HEIGHT / 2.0);
            let mut grab_offset = m::Vec2::zero();
            if let Some(body) = world.get_body_mut(key) {
                grab_offset = cursor - body.pose.translation;
                body.pose.translation = target - grab_offset;
                body.velocity = phys::Velocity::default();
            }
            world.push_out(key);
            println!("dragged {:?} to {:?}", key, target - grab_offset);
        }
        Some(key) => println!("{:?} under the cursor can't be dragged", key),
        None => println!("nothing under the cursor at {:?}", cursor),
    }

    // right click and release: flick the first dynamic ball towards the cursor
    let flick_target = m::Vec2::new(WIDTH - 5.0, HEIGHT - 5.0);
    let flicked = world
        .bodies()
        .find(|(_, body)| body.body_type() == phys::BodyType::Dynamic)
        .map(|(key, _)| key);
    if let Some(body) = flicked.and_then(|key| world.get_body_mut(key)) {
        let pull = flick_target - body.pose.translation;
        body.velocity.linear += pull * 10.0 * dt;
    }

    run(&mut world, 60);
    report("after flick", &world);

    // middle drag: pan everything except the walls
    let pan = m::Vec2::new(0.0, 2.0);
    for (key, body) in world.bodies_mut() {
        if !walls.contains(&key) {
            body.pose.translation += pan;
        }
    }

    run(&mut world, 240);
    report("final", &world);
}

fn build_walls(world: &mut phys::World) -> [phys::BodyKey; 4] {
    let corners = [
        m::Vec2::new(0.0, 0.0),
        m::Vec2::new(WIDTH, 0.0),
        m::Vec2::new(WIDTH, HEIGHT),
        m::Vec2::new(0.0, HEIGHT),
    ];
    std::array::from_fn(|i| {
        let edge = Edge::new(corners[i], corners[(i + 1) % 4]);
        world.create_body(phys::BodyParams::new_static().with_restitution(0.6), edge)
    })
}

fn reset_balls(world: &mut phys::World, seed: u64) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let x_dist = distr::Uniform::new(8.0, WIDTH - 8.0);
    let y_dist = distr::Uniform::new(8.0, HEIGHT - 8.0);
    let radius_dist = distr::Uniform::new(1.0, 3.0);
    let static_radius_dist = distr::Uniform::new(4.0, 6.0);

    for i in 0..STATIC_BALLS {
        let x = WIDTH * (i as f64 + 1.0) / (STATIC_BALLS as f64 + 1.0);
        world.create_body(
            phys::BodyParams::new_static().with_position([x, 12.0]),
            Circle::new(static_radius_dist.sample(&mut rng)),
        );
    }
    for _ in 0..DYNAMIC_BALLS {
        world.create_body(
            phys::BodyParams::new_dynamic()
                .with_position([x_dist.sample(&mut rng), y_dist.sample(&mut rng)])
                .with_density(5.0)
                .with_restitution(0.8)
                .with_friction(0.2),
            Circle::new(radius_dist.sample(&mut rng)),
        );
    }
}

fn is_dynamic(world: &phys::World, key: phys::BodyKey) -> bool {
    world
        .get_body(key)
        .map_or(false, |body| body.body_type() == phys::BodyType::Dynamic)
}

fn report(label: &str, world: &phys::World) {
    let (count, height_sum, energy) = world
        .bodies()
        .filter(|(_, body)| body.body_type() == phys::BodyType::Dynamic)
        .fold((0, 0.0, 0.0), |(count, heights, energy), (_, body)| {
            let mass = body.mass().value().unwrap_or(0.0);
            (
                count + 1,
                heights + body.pose.translation.y,
                energy + 0.5 * mass * body.velocity.linear.mag_sq(),
            )
        });
    println!(
        "{:>12}: {} balls, mean height {:.2}, kinetic energy {:.1}, {} contacts",
        label,
        count,
        height_sum / count.max(1) as f64,
        energy,
        world.contacts().len()
    );
}
