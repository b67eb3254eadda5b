#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either decode to a valid mesh or fail cleanly.
    if let Ok(mesh) = isomesh::mesh::IntermediateMesh::from_bytes(data) {
        let vertices = mesh.vertex_count();
        assert!(mesh.triangles().len() % 3 == 0);
        assert!(mesh.triangles().iter().all(|&i| (i as usize) < vertices));

        let mut welded = mesh;
        welded.make_unique();
        assert!(welded.vertex_count() <= vertices);
        let _ = welded.divide_into_small(64);
    }
});
