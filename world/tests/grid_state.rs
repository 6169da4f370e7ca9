use stackrise_core::{BlockId, BlockKind, CellCoord, Command, Event};
use stackrise_world::{apply, query, World};

fn configured(columns: u32, rows: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(&mut world, Command::ConfigureGrid { columns, rows }, &mut events);
    world
}

fn place(world: &mut World, column: u32, row: u32, kind: BlockKind) -> BlockId {
    let mut events = Vec::new();
    apply(
        world,
        Command::PlaceBlock {
            cell: CellCoord::new(column, row),
            kind,
            usable: true,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::BlockPlaced { block, .. }] => *block,
        other => panic!("unexpected events: {other:?}"),
    }
}

fn assert_single_occupancy(world: &World) {
    let view = query::grid_view(world);
    let live: Vec<_> = query::blocks(world)
        .into_iter()
        .filter(|block| !block.disappearing)
        .collect();
    for block in &live {
        assert_eq!(view.occupant(block.cell), Some(block.id));
    }
    assert_eq!(view.occupied().count(), live.len());
}

#[test]
fn swap_exchanges_two_blocks() {
    let mut world = configured(3, 3);
    let red = place(&mut world, 0, 0, BlockKind::Red);
    let blue = place(&mut world, 1, 0, BlockKind::Blue);

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SwapCells {
            first: CellCoord::new(0, 0),
            second: CellCoord::new(1, 0),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            Event::BlockMoved {
                block: red,
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
            },
            Event::BlockMoved {
                block: blue,
                from: CellCoord::new(1, 0),
                to: CellCoord::new(0, 0),
            },
        ]
    );
    assert_eq!(
        query::block(&world, red).map(|block| block.cell),
        Some(CellCoord::new(1, 0))
    );
    assert_single_occupancy(&world);
}

#[test]
fn swap_with_empty_cell_moves_the_block() {
    let mut world = configured(3, 3);
    let green = place(&mut world, 1, 1, BlockKind::Green);

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SwapCells {
            first: CellCoord::new(2, 1),
            second: CellCoord::new(1, 1),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BlockMoved {
            block: green,
            from: CellCoord::new(1, 1),
            to: CellCoord::new(2, 1),
        }]
    );
    assert!(query::grid_view(&world).is_empty(CellCoord::new(1, 1)));
    assert_single_occupancy(&world);
}

#[test]
fn invalid_mutations_are_skipped() {
    let mut world = configured(2, 2);
    let red = place(&mut world, 0, 0, BlockKind::Red);
    let _ = place(&mut world, 1, 0, BlockKind::Blue);
    let mut events = Vec::new();

    let commands = [
        Command::PlaceBlock {
            cell: CellCoord::new(0, 0),
            kind: BlockKind::White,
            usable: true,
        },
        Command::PlaceBlock {
            cell: CellCoord::new(5, 0),
            kind: BlockKind::White,
            usable: true,
        },
        Command::MoveBlock {
            from: CellCoord::new(0, 0),
            to: CellCoord::new(1, 0),
        },
        Command::MoveBlock {
            from: CellCoord::new(0, 1),
            to: CellCoord::new(1, 1),
        },
        Command::SwapCells {
            first: CellCoord::new(0, 1),
            second: CellCoord::new(1, 1),
        },
        Command::SwapCells {
            first: CellCoord::new(1, 0),
            second: CellCoord::new(2, 0),
        },
        Command::MarkDisappearing {
            cell: CellCoord::new(1, 1),
        },
        Command::HideBlock { block: red },
        Command::DestroyBlock {
            block: BlockId::new(99),
        },
    ];
    for command in commands {
        apply(&mut world, command, &mut events);
    }

    assert!(events.is_empty(), "unexpected events: {events:?}");
    assert_eq!(query::blocks(&world).len(), 2);
    assert_single_occupancy(&world);
}

#[test]
fn disappearing_block_leaves_cell_until_destroyed() {
    let mut world = configured(2, 3);
    let red = place(&mut world, 0, 1, BlockKind::Red);
    let mut events = Vec::new();

    apply(
        &mut world,
        Command::MarkDisappearing {
            cell: CellCoord::new(0, 1),
        },
        &mut events,
    );
    assert!(query::grid_view(&world).is_empty(CellCoord::new(0, 1)));
    let snapshot = query::block(&world, red).expect("block alive while disappearing");
    assert!(snapshot.disappearing);

    let filler = place(&mut world, 0, 1, BlockKind::Blue);
    apply(&mut world, Command::HideBlock { block: red }, &mut events);
    apply(&mut world, Command::DestroyBlock { block: red }, &mut events);
    apply(&mut world, Command::DestroyBlock { block: red }, &mut events);

    assert_eq!(
        events,
        vec![
            Event::BlockDisappearing {
                block: red,
                cell: CellCoord::new(0, 1),
            },
            Event::BlockHidden { block: red },
            Event::BlockDestroyed { block: red },
        ]
    );
    assert_eq!(
        query::grid_view(&world).occupant(CellCoord::new(0, 1)),
        Some(filler)
    );
    assert_single_occupancy(&world);
}

#[test]
fn promotion_happens_once() {
    let mut world = configured(2, 2);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::PlaceBlock {
            cell: CellCoord::new(0, 0),
            kind: BlockKind::Orange,
            usable: false,
        },
        &mut events,
    );
    let block = query::blocks(&world)[0].id;
    events.clear();

    apply(&mut world, Command::PromoteBlock { block }, &mut events);
    apply(&mut world, Command::PromoteBlock { block }, &mut events);

    assert_eq!(
        events,
        vec![Event::BlockPromoted {
            block,
            cell: CellCoord::new(0, 0),
        }]
    );
    assert!(query::block(&world, block).is_some_and(|snapshot| snapshot.usable));
}

#[test]
fn adjacency_queries_respect_bounds() {
    let world = configured(3, 3);
    assert!(query::is_valid_position(&world, CellCoord::new(2, 2)));
    assert!(!query::is_valid_position(&world, CellCoord::new(3, 0)));
    assert!(query::are_adjacent(
        &world,
        CellCoord::new(1, 1),
        CellCoord::new(1, 2)
    ));
    assert!(!query::are_adjacent(
        &world,
        CellCoord::new(2, 2),
        CellCoord::new(3, 2)
    ));
    assert!(!query::are_adjacent(
        &world,
        CellCoord::new(0, 0),
        CellCoord::new(1, 1)
    ));
}
